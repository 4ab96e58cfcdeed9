use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::RecordId;

/// Every record sharing one title. The first id is the one that stays in the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub title: String,
    pub ids: Vec<RecordId>,
}

impl DuplicateGroup {
    /// Ids removed from the table; empty for a malformed group.
    pub fn dropped(&self) -> &[RecordId] {
        self.ids.get(1..).unwrap_or_default()
    }
}

/// Terminal state of a record after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordFate {
    DroppedDuplicate,
    ExcludedNoAbstract,
    ExcludedNoKeyword,
    ExcludedUnrelated,
    ExcludedMentioned,
    /// Error or unparseable verdict under `FallbackPolicy::Exclude`.
    ExcludedUnclassified,
    Kept,
    KeptOnError,
    KeptOnUnparseable,
}

impl RecordFate {
    pub fn is_kept(&self) -> bool {
        matches!(
            self,
            RecordFate::Kept | RecordFate::KeptOnError | RecordFate::KeptOnUnparseable
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_records: usize,
    pub duplicate_groups: Vec<DuplicateGroup>,
    pub no_abstract: Vec<RecordId>,
    pub no_keyword: Vec<RecordId>,
    pub unrelated: Vec<RecordId>,
    pub mentioned_only: Vec<RecordId>,
    pub unparseable: Vec<RecordId>,
    pub errored: Vec<RecordId>,
    /// Records handed to the classifier, in call order.
    pub classified: Vec<RecordId>,
    pub kept: Vec<RecordId>,
    pub fates: BTreeMap<RecordId, RecordFate>,
}

impl ScreeningReport {
    pub fn duplicate_count(&self) -> usize {
        self.duplicate_groups.iter().map(|g| g.ids.len()).sum()
    }

    pub fn fate(&self, id: RecordId) -> Option<RecordFate> {
        self.fates.get(&id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dropped_tolerates_short_groups() {
        let empty: DuplicateGroup = serde_json::from_str(r#"{"title": "A", "ids": []}"#).unwrap();
        assert!(empty.dropped().is_empty());

        let group = DuplicateGroup {
            title: "A".to_string(),
            ids: vec![RecordId(2), RecordId(5), RecordId(7)],
        };
        assert_eq!(group.dropped(), &[RecordId(5), RecordId(7)]);
    }
}
