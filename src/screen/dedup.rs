use std::collections::HashMap;

use crate::models::{DuplicateGroup, RecordId, Table};

/// Keeps the first record for each exact title and reports every title that
/// occurred more than once. Records without a title are never grouped.
pub fn deduplicate(table: Table) -> (Table, Vec<DuplicateGroup>) {
    let mut groups: Vec<DuplicateGroup> = Vec::new();
    let mut by_title: HashMap<String, usize> = HashMap::new();
    let mut records = Vec::with_capacity(table.records.len());

    for record in table.records {
        let Some(title) = record.title.clone() else {
            records.push(record);
            continue;
        };

        match by_title.get(&title) {
            Some(&group) => groups[group].ids.push(record.id),
            None => {
                by_title.insert(title.clone(), groups.len());
                groups.push(DuplicateGroup {
                    title,
                    ids: vec![record.id],
                });
                records.push(record);
            }
        }
    }

    groups.retain(|g| g.ids.len() > 1);

    let dropped: usize = groups.iter().map(|g| g.dropped().len()).sum();
    tracing::info!(
        "Deduplication: {} duplicate title(s), {} record(s) dropped",
        groups.len(),
        dropped
    );

    (Table::new(table.columns, records), groups)
}

/// Ids removed by deduplication, in original order.
pub fn dropped_ids(groups: &[DuplicateGroup]) -> Vec<RecordId> {
    let mut ids: Vec<RecordId> = groups.iter().flat_map(|g| g.dropped().iter().copied()).collect();
    ids.sort();
    ids
}
