use std::collections::BTreeSet;

use crate::models::{RecordId, Table};

/// Ids removed from the final output. Grows only; there is no removal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    ids: BTreeSet<RecordId>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.ids.contains(&id)
    }
}

impl Extend<RecordId> for ExclusionSet {
    fn extend<T: IntoIterator<Item = RecordId>>(&mut self, iter: T) {
        self.ids.extend(iter);
    }
}

impl<'a> Extend<&'a RecordId> for ExclusionSet {
    fn extend<T: IntoIterator<Item = &'a RecordId>>(&mut self, iter: T) {
        self.ids.extend(iter.into_iter().copied());
    }
}

/// Rows of `table` not in `excluded`, original order preserved.
pub fn retain_survivors(table: Table, excluded: &ExclusionSet) -> Table {
    let records = table
        .records
        .into_iter()
        .filter(|r| !excluded.contains(r.id))
        .collect();
    Table::new(table.columns, records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;

    #[test]
    fn test_union_and_order() {
        let table = Table::new(
            vec!["Title".into(), "Abstract".into()],
            (0..6).map(|i| Record::new(i, None, Some("x"))).collect(),
        );
        let mut excluded = ExclusionSet::new();
        excluded.extend(&[RecordId(4), RecordId(1)]);
        excluded.extend(vec![RecordId(1), RecordId(2)]);

        let kept = retain_survivors(table, &excluded);

        assert!(excluded.contains(RecordId(2)));
        assert_eq!(kept.ids(), vec![RecordId(0), RecordId(3), RecordId(5)]);
    }
}
