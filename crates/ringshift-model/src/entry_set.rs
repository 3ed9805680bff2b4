//! Batch-wide collection of entry outcomes.

use std::collections::BTreeMap;

use ringshift_common::analysis_config::EntryId;

use crate::failure::{EntryFailure, EntryOutcome};
use crate::protein::EntryModel;

/// Entry outcomes keyed by (structure id, shift set id).
///
/// Written only by the driver merging finished entries; everything
/// downstream reads it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntrySet {
    entries: BTreeMap<EntryId, EntryOutcome>,
}

impl EntrySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an entry's outcome, returning the one it replaces.
    pub fn insert(&mut self, entry: EntryId, outcome: EntryOutcome) -> Option<EntryOutcome> {
        self.entries.insert(entry, outcome)
    }

    pub fn get(&self, entry: &EntryId) -> Option<&EntryOutcome> {
        self.entries.get(entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EntryId, &EntryOutcome)> {
        self.entries.iter()
    }

    pub fn models(&self) -> impl Iterator<Item = &EntryModel> {
        self.entries.values().filter_map(EntryOutcome::model)
    }

    pub fn models_mut(&mut self) -> impl Iterator<Item = &mut EntryModel> {
        self.entries.values_mut().filter_map(EntryOutcome::model_mut)
    }

    pub fn failures(&self) -> impl Iterator<Item = (&EntryId, &EntryFailure)> {
        self.entries
            .iter()
            .filter_map(|(id, outcome)| outcome.failure().map(|f| (id, f)))
    }
}

impl FromIterator<(EntryId, EntryOutcome)> for EntrySet {
    fn from_iter<I: IntoIterator<Item = (EntryId, EntryOutcome)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringshift_common::residue::NumberingConvention;

    #[test]
    fn test_models_and_failures_split() {
        let ok = EntryId::new("1abc", "4001");
        let bad = EntryId::new("2def", "4002");
        let set: EntrySet = [
            (
                ok.clone(),
                EntryOutcome::Model(Box::new(EntryModel::new(ok.clone(), NumberingConvention::Label, 1))),
            ),
            (bad.clone(), EntryOutcome::Failure(EntryFailure::NoPairsFound)),
        ]
        .into_iter()
        .collect();

        assert_eq!(set.len(), 2);
        assert_eq!(set.models().count(), 1);
        let failures: Vec<_> = set.failures().collect();
        assert_eq!(failures, vec![(&bad, &EntryFailure::NoPairsFound)]);
    }

    #[test]
    fn test_insert_replaces() {
        let id = EntryId::new("1abc", "4001");
        let mut set = EntrySet::new();
        assert!(set.insert(id.clone(), EntryOutcome::Failure(EntryFailure::NoPairsFound)).is_none());
        let old = set.insert(id.clone(), EntryOutcome::Failure(EntryFailure::NoAromaticResidues));
        assert_eq!(old, Some(EntryOutcome::Failure(EntryFailure::NoPairsFound)));
        assert_eq!(set.len(), 1);
    }
}
