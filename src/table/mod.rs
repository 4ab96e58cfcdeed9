pub mod reader;
pub mod writer;

use std::path::{Path, PathBuf};

use crate::error::Result;

pub use reader::load_table;
pub use writer::{check_output_path, write_table};

pub const TITLE_COLUMN: &str = "Title";
pub const ABSTRACT_COLUMN: &str = "Abstract";
/// Leading id column added to written rows.
pub const NUMBER_COLUMN: &str = "Number";
pub const OUTPUT_STEM: &str = "filtered_output_step_gpt";

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods", "csv"];

/// Source-locale column names renamed to `Title` and `Abstract` at load time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub title: String,
    pub abstract_text: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            title: crate::config::DEFAULT_TITLE_COLUMN.to_string(),
            abstract_text: crate::config::DEFAULT_ABSTRACT_COLUMN.to_string(),
        }
    }
}

impl ColumnMapping {
    pub fn canonical_name<'a>(&self, header: &'a str) -> &'a str {
        if header == self.title {
            TITLE_COLUMN
        } else if header == self.abstract_text {
            ABSTRACT_COLUMN
        } else {
            header
        }
    }
}

pub(crate) fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default()
}

pub fn is_spreadsheet(path: &Path) -> bool {
    SPREADSHEET_EXTENSIONS.contains(&extension_of(path).as_str())
}

/// Output lands next to the input under a fixed name; CSV input keeps CSV.
pub fn output_path_for(input: &Path) -> PathBuf {
    let dir = input.parent().unwrap_or_else(|| Path::new("."));
    let ext = if extension_of(input) == "csv" { "csv" } else { "xlsx" };
    dir.join(format!("{}.{}", OUTPUT_STEM, ext))
}

/// Spreadsheets directly inside `dir`, sorted by file name. Earlier outputs
/// of this tool are skipped.
pub fn list_spreadsheets(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() || !is_spreadsheet(&path) {
            continue;
        }
        let is_output = path
            .file_stem()
            .and_then(|s| s.to_str())
            .map(|s| s == OUTPUT_STEM)
            .unwrap_or(false);
        if !is_output {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
