//! Core domain types: catalog skills and per-publisher aggregates.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Owner assigned to skills whose `source` has no `owner/` prefix.
pub const UNATTRIBUTED_OWNER: &str = "(unattributed)";

// ---------------------------------------------------------------------------
// Skill
// ---------------------------------------------------------------------------

/// A single catalog entry as returned by the search API.
///
/// Fields beyond `id`, `name`, `installs`, and `source` are carried through
/// untouched in `extra`, so the cache and JSON export keep whatever the API sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    /// Globally unique identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Install count.
    #[serde(default)]
    pub installs: u64,
    /// Source reference, `owner/repository`.
    #[serde(default)]
    pub source: String,
    /// Opaque passthrough fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Skill {
    /// Build a skill with no passthrough fields.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        installs: u64,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            installs,
            source: source.into(),
            extra: serde_json::Map::new(),
        }
    }

    /// The publisher this skill belongs to: the first `/`-separated segment of
    /// `source`, or `None` when `source` is not of the form `owner/...`.
    pub fn owner(&self) -> Option<&str> {
        match self.source.split_once('/') {
            Some((owner, _)) if !owner.is_empty() => Some(owner),
            _ => None,
        }
    }

    /// Like [`Skill::owner`], falling back to [`UNATTRIBUTED_OWNER`].
    pub fn owner_or_unattributed(&self) -> &str {
        self.owner().unwrap_or(UNATTRIBUTED_OWNER)
    }
}

// ---------------------------------------------------------------------------
// PublisherAggregate
// ---------------------------------------------------------------------------

/// A member entry inside a [`PublisherAggregate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublisherSkill {
    pub name: String,
    pub installs: u64,
    /// The skill's full `source` value.
    pub repo: String,
}

/// Per-owner summary statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublisherAggregate {
    /// Owner name (first segment of `source`).
    pub owner: String,
    /// Number of member skills.
    pub count: usize,
    /// Sum of member installs.
    pub total_installs: u64,
    /// Number of distinct repositories.
    pub repos: usize,
    /// The distinct repositories themselves, sorted.
    pub repositories: BTreeSet<String>,
    /// Members, sorted by installs descending.
    pub skills: Vec<PublisherSkill>,
}
