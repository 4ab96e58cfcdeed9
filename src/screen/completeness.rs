use std::collections::BTreeSet;

use crate::models::{Record, RecordId, Table};

pub fn has_abstract(record: &Record) -> bool {
    record
        .abstract_text
        .as_deref()
        .map(|a| !a.trim().is_empty())
        .unwrap_or(false)
}

/// Ids whose abstract is absent or blank after trimming.
pub fn missing_abstracts(table: &Table) -> BTreeSet<RecordId> {
    let flagged: BTreeSet<RecordId> = table
        .records
        .iter()
        .filter(|r| !has_abstract(r))
        .map(|r| r.id)
        .collect();

    tracing::info!("Completeness: {} record(s) without an abstract", flagged.len());
    flagged
}
