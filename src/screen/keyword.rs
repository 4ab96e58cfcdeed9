use std::collections::BTreeSet;

use crate::models::{RecordId, Table};

/// Cheap topic pre-filter run before any LLM call.
#[derive(Debug, Clone)]
pub struct KeywordGate {
    keywords: Vec<String>,
}

impl KeywordGate {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Case-insensitive substring match against any keyword.
    pub fn matches(&self, text: &str) -> bool {
        let text = text.to_lowercase();
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }

    /// Ids outside `skip` whose abstract mentions no keyword.
    pub fn flag(&self, table: &Table, skip: &BTreeSet<RecordId>) -> BTreeSet<RecordId> {
        let flagged: BTreeSet<RecordId> = table
            .records
            .iter()
            .filter(|r| !skip.contains(&r.id))
            .filter(|r| !self.matches(r.abstract_text.as_deref().unwrap_or_default()))
            .map(|r| r.id)
            .collect();

        tracing::info!("Keyword gate: {} record(s) without a topic keyword", flagged.len());
        flagged
    }
}
