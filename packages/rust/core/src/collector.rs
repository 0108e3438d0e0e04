//! Deduplicating collector: folds per-query batches into one canonical set.

use std::collections::HashMap;

use skillscope_shared::Skill;

/// Counts reported after merging one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeStats {
    /// Records in the batch.
    pub fetched: usize,
    /// Identifiers not seen before this batch.
    pub added: usize,
    /// Canonical set size after the merge.
    pub total: usize,
}

/// Canonical set of skills keyed by `id`.
///
/// Batches must be merged in query-plan order. A repeated identifier replaces
/// the stored record wholesale (last write wins) but keeps the position where
/// the identifier was first seen, so ties in the final sort are reproducible.
#[derive(Debug, Default)]
pub struct Collector {
    index: HashMap<String, usize>,
    skills: Vec<Skill>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one batch into the set.
    pub fn merge(&mut self, batch: Vec<Skill>) -> MergeStats {
        let fetched = batch.len();
        let before = self.skills.len();

        for skill in batch {
            match self.index.get(&skill.id) {
                Some(&slot) => self.skills[slot] = skill,
                None => {
                    self.index.insert(skill.id.clone(), self.skills.len());
                    self.skills.push(skill);
                }
            }
        }

        MergeStats {
            fetched,
            added: self.skills.len() - before,
            total: self.skills.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// Current record for `id`.
    pub fn get(&self, id: &str) -> Option<&Skill> {
        self.index.get(id).map(|&slot| &self.skills[slot])
    }

    /// Consume the set, returning skills by installs descending.
    pub fn into_sorted(self) -> Vec<Skill> {
        let mut skills = self.skills;
        sort_by_installs(&mut skills);
        skills
    }
}

/// Stable sort by installs descending; ties keep their current order.
pub fn sort_by_installs(skills: &mut [Skill]) {
    skills.sort_by(|a, b| b.installs.cmp(&a.installs));
}
