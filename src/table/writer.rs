use std::path::Path;

use rust_xlsxwriter::{Workbook, Worksheet};

use crate::error::{Error, Result};
use crate::models::{Cell, Table};
use crate::table::{extension_of, NUMBER_COLUMN};

const WRITABLE_EXTENSIONS: &[&str] = &["xlsx", "csv"];

/// Fails unless `path` has an extension `write_table` can produce. Call it
/// before the classifier stage so a bad `--output` never wastes a run.
pub fn check_output_path(path: &Path) -> Result<()> {
    let ext = extension_of(path);
    if WRITABLE_EXTENSIONS.contains(&ext.as_str()) {
        Ok(())
    } else {
        Err(Error::UnsupportedFormat(format!(
            "cannot write '{}' (expected .xlsx or .csv)",
            path.display()
        )))
    }
}

/// Writes `table` with a leading `Number` column holding each record id.
/// Format follows the extension of `path` (`.xlsx` or `.csv`).
pub fn write_table(table: &Table, path: &Path) -> Result<()> {
    check_output_path(path)?;
    match extension_of(path).as_str() {
        "csv" => write_csv(table, path)?,
        _ => write_xlsx(table, path)?,
    }

    tracing::info!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

fn write_xlsx(table: &Table, path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    worksheet.write_string(0, 0, NUMBER_COLUMN)?;
    for (col, name) in table.columns.iter().enumerate() {
        worksheet.write_string(0, to_col(col + 1)?, name.as_str())?;
    }

    for (i, record) in table.records.iter().enumerate() {
        let row = u32::try_from(i + 1)
            .map_err(|_| Error::UnsupportedFormat("too many rows for xlsx".to_string()))?;
        worksheet.write_number(row, 0, record.id.0 as f64)?;
        for (col, cell) in record.cells.iter().enumerate() {
            write_cell(worksheet, row, to_col(col + 1)?, cell)?;
        }
    }

    workbook.save(path)?;
    Ok(())
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &Cell) -> Result<()> {
    match cell {
        Cell::Empty => {}
        Cell::Text(s) => {
            worksheet.write_string(row, col, s.as_str())?;
        }
        Cell::Int(i) => {
            worksheet.write_number(row, col, *i as f64)?;
        }
        Cell::Float(f) => {
            worksheet.write_number(row, col, *f)?;
        }
        Cell::Bool(b) => {
            worksheet.write_boolean(row, col, *b)?;
        }
    }
    Ok(())
}

fn to_col(col: usize) -> Result<u16> {
    u16::try_from(col).map_err(|_| Error::UnsupportedFormat("too many columns for xlsx".to_string()))
}

fn write_csv(table: &Table, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let header = std::iter::once(NUMBER_COLUMN.to_string()).chain(table.columns.iter().cloned());
    writer.write_record(header)?;

    for record in &table.records {
        let row = std::iter::once(record.id.to_string())
            .chain(record.cells.iter().map(|c| c.as_text().unwrap_or_default()));
        writer.write_record(row)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;

    #[test]
    fn test_csv_has_number_column_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let table = Table::new(
            vec!["Title".to_string(), "Abstract".to_string()],
            vec![Record::new(3, Some("C"), Some("a chatbot study"))],
        );

        write_table(&table, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "Number,Title,Abstract\n3,C,a chatbot study\n");
    }

    #[test]
    fn test_check_output_path() {
        assert!(check_output_path(Path::new("/data/out.xlsx")).is_ok());
        assert!(check_output_path(Path::new("/data/out.CSV")).is_ok());
        for bad in ["/data/out.xls", "/data/out.ods", "/data/out"] {
            let err = check_output_path(Path::new(bad)).unwrap_err();
            assert!(matches!(err, Error::UnsupportedFormat(_)), "{}", bad);
        }
    }

    #[test]
    fn test_unwritable_extension_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.ods");

        assert!(write_table(&Table::default(), &path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_xlsx_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xlsx");
        let table = Table::new(
            vec!["Title".to_string(), "Abstract".to_string()],
            vec![Record::new(0, Some("A"), None)],
        );

        write_table(&table, &path).unwrap();
        assert!(path.metadata().unwrap().len() > 0);
    }
}
