//! Publisher aggregation: group skills by owner and rank the owners.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use skillscope_shared::{PublisherAggregate, PublisherSkill, Skill};

/// Running totals for one owner.
#[derive(Debug, Clone, Default)]
struct OwnerTally {
    count: usize,
    total_installs: u64,
    repositories: BTreeSet<String>,
    skills: Vec<PublisherSkill>,
}

/// Explicit accumulator for owner → totals.
///
/// Feed it skills in any order (or merge partial accumulators), then call
/// [`PublisherAccumulator::finish`] for the ranked aggregates. The result does
/// not depend on feeding order.
#[derive(Debug, Clone, Default)]
pub struct PublisherAccumulator {
    owners: BTreeMap<String, OwnerTally>,
    unattributed: usize,
}

impl PublisherAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one skill to its owner's totals.
    pub fn add(&mut self, skill: &Skill) {
        if skill.owner().is_none() {
            self.unattributed += 1;
        }

        let tally = self
            .owners
            .entry(skill.owner_or_unattributed().to_string())
            .or_default();
        tally.count += 1;
        tally.total_installs = tally.total_installs.saturating_add(skill.installs);
        tally.repositories.insert(skill.source.clone());
        tally.skills.push(PublisherSkill {
            name: skill.name.clone(),
            installs: skill.installs,
            repo: skill.source.clone(),
        });
    }

    /// Add every skill in `skills`.
    pub fn extend<'a>(&mut self, skills: impl IntoIterator<Item = &'a Skill>) {
        for skill in skills {
            self.add(skill);
        }
    }

    /// Fold another accumulator into this one.
    pub fn merge(&mut self, other: PublisherAccumulator) {
        self.unattributed += other.unattributed;
        for (owner, theirs) in other.owners {
            let ours = self.owners.entry(owner).or_default();
            ours.count += theirs.count;
            ours.total_installs = ours.total_installs.saturating_add(theirs.total_installs);
            ours.repositories.extend(theirs.repositories);
            ours.skills.extend(theirs.skills);
        }
    }

    /// Number of skills whose `source` had no owner segment.
    pub fn unattributed(&self) -> usize {
        self.unattributed
    }

    /// Produce aggregates ranked by total installs (desc), then owner name.
    pub fn finish(self) -> Vec<PublisherAggregate> {
        if self.unattributed > 0 {
            warn!(
                skills = self.unattributed,
                "skills without an owner/repo source were grouped as unattributed"
            );
        }

        let mut aggregates: Vec<PublisherAggregate> = self
            .owners
            .into_iter()
            .map(|(owner, mut tally)| {
                tally.skills.sort_by(member_order);
                PublisherAggregate {
                    owner,
                    count: tally.count,
                    total_installs: tally.total_installs,
                    repos: tally.repositories.len(),
                    repositories: tally.repositories,
                    skills: tally.skills,
                }
            })
            .collect();

        aggregates.sort_by(|a, b| {
            b.total_installs
                .cmp(&a.total_installs)
                .then_with(|| a.owner.cmp(&b.owner))
        });
        aggregates
    }
}

/// Installs descending, then name, then repo.
fn member_order(a: &PublisherSkill, b: &PublisherSkill) -> Ordering {
    b.installs
        .cmp(&a.installs)
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.repo.cmp(&b.repo))
}

/// Group `skills` by owner and rank the owners.
pub fn aggregate(skills: &[Skill]) -> Vec<PublisherAggregate> {
    let mut acc = PublisherAccumulator::new();
    acc.extend(skills);
    acc.finish()
}
