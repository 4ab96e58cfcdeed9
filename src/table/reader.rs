use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};

use crate::error::{Error, Result};
use crate::models::{Cell, Record, RecordId, Table};
use crate::table::{extension_of, ColumnMapping, ABSTRACT_COLUMN, TITLE_COLUMN};

/// Reads the first worksheet (or a CSV file) into a `Table`. The header row
/// names the columns; every data row, blank ones included, gets ids `0..n`
/// in file order.
pub fn load_table(path: &Path, mapping: &ColumnMapping) -> Result<Table> {
    let (headers, rows) = match extension_of(path).as_str() {
        "csv" => read_csv(path)?,
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => read_workbook(path)?,
        other => return Err(Error::UnsupportedFormat(other.to_string())),
    };

    tracing::info!("Loaded {} rows from {}", rows.len(), path.display());
    tracing::debug!("Source columns: {:?}", headers);

    build_table(headers, rows, mapping)
}

fn read_workbook(path: &Path) -> Result<(Vec<String>, Vec<Vec<Cell>>)> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::EmptySheet(path.display().to_string()))??;

    let mut rows = range.rows();
    let headers = rows
        .next()
        .ok_or_else(|| Error::EmptySheet(path.display().to_string()))?
        .iter()
        .map(|d| convert_cell(d).as_text().unwrap_or_default())
        .collect();

    Ok((headers, rows.map(|row| row.iter().map(convert_cell).collect()).collect()))
}

fn read_csv(path: &Path) -> Result<(Vec<String>, Vec<Vec<Cell>>)> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(Cell::from).collect());
    }
    Ok((headers, rows))
}

fn convert_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::Float(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(e) => Cell::Text(format!("#{:?}", e)),
    }
}

pub(crate) fn build_table(
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
    mapping: &ColumnMapping,
) -> Result<Table> {
    let columns: Vec<String> = headers
        .iter()
        .map(|h| mapping.canonical_name(h).to_string())
        .collect();

    let title_idx = column_index(&columns, TITLE_COLUMN, &mapping.title)?;
    let abstract_idx = column_index(&columns, ABSTRACT_COLUMN, &mapping.abstract_text)?;

    // Blank rows keep their position so ids match the source row numbers.
    let records = rows
        .into_iter()
        .enumerate()
        .map(|(id, mut cells)| {
            cells.resize(columns.len(), Cell::Empty);
            Record {
                id: RecordId(id),
                title: cells[title_idx].as_text(),
                abstract_text: cells[abstract_idx].as_text(),
                cells,
            }
        })
        .collect();

    Ok(Table::new(columns, records))
}

fn column_index(columns: &[String], canonical: &str, source: &str) -> Result<usize> {
    columns
        .iter()
        .position(|c| c == canonical)
        .ok_or_else(|| Error::MissingColumn(format!("{} (expected '{}' or '{}')", canonical, source, canonical)))
}
