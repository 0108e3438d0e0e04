//! Time-bounded local snapshot of the last successful full fetch.
//!
//! The [`CacheStore`] persists `{ "timestamp": <unix secs>, "skills": [...] }`
//! as a single JSON file and answers whether it is still inside the freshness
//! window.
//!
//! **Access rules:**
//! - read once at the start of a pipeline run via [`CacheStore::load`]
//! - written once at the end of a successful fetch via [`CacheStore::save`]
//! - unreadable or malformed content is a miss, never an error

mod atomic;

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use skillscope_shared::{CacheConfig, Result, Skill, SkillscopeError};

pub use atomic::write_atomic;

/// On-disk snapshot format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSnapshot {
    /// Unix time of the fetch, in (fractional) seconds.
    pub timestamp: f64,
    /// The full, deduplicated skill list in installs-descending order.
    pub skills: Vec<Skill>,
}

/// What [`CacheStore::inspect`] found on disk.
#[derive(Debug, Clone)]
pub enum CacheStatus {
    /// No snapshot file.
    Missing,
    /// The file exists but could not be read or decoded.
    Corrupt { reason: String },
    /// A valid snapshot older than the freshness window.
    Expired { age: Duration, count: usize },
    /// A valid snapshot inside the freshness window.
    Fresh { age: Duration, skills: Vec<Skill> },
}

/// File-backed snapshot store.
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
    max_age: Duration,
}

impl CacheStore {
    /// Create a store from the resolved cache configuration.
    pub fn new(config: &CacheConfig) -> Self {
        Self::at(config.path.clone(), config.max_age)
    }

    /// Create a store for an explicit snapshot path.
    pub fn at(path: impl Into<PathBuf>, max_age: Duration) -> Self {
        Self {
            path: path.into(),
            max_age,
        }
    }

    /// Snapshot file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Freshness window.
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Classify the snapshot as of now.
    pub fn inspect(&self) -> CacheStatus {
        self.inspect_at(SystemTime::now())
    }

    /// Classify the snapshot as of `now`.
    pub fn inspect_at(&self, now: SystemTime) -> CacheStatus {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return CacheStatus::Missing,
            Err(e) => {
                return CacheStatus::Corrupt {
                    reason: format!("unreadable: {e}"),
                };
            }
        };

        let snapshot: CacheSnapshot = match serde_json::from_slice(&bytes) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                return CacheStatus::Corrupt {
                    reason: format!("malformed: {e}"),
                };
            }
        };

        let Some(age) = snapshot_age(snapshot.timestamp, now) else {
            return CacheStatus::Corrupt {
                reason: format!("invalid timestamp {}", snapshot.timestamp),
            };
        };

        if age > self.max_age {
            CacheStatus::Expired {
                age,
                count: snapshot.skills.len(),
            }
        } else {
            CacheStatus::Fresh {
                age,
                skills: snapshot.skills,
            }
        }
    }

    /// Return the cached skills and their age if a fresh snapshot exists.
    pub fn load(&self) -> Option<(Vec<Skill>, Duration)> {
        self.load_at(SystemTime::now())
    }

    /// [`CacheStore::load`] as of `now`.
    pub fn load_at(&self, now: SystemTime) -> Option<(Vec<Skill>, Duration)> {
        match self.inspect_at(now) {
            CacheStatus::Fresh { age, skills } => {
                info!(
                    age_secs = age.as_secs(),
                    skills = skills.len(),
                    "using cached snapshot"
                );
                Some((skills, age))
            }
            CacheStatus::Expired { age, count } => {
                info!(
                    age_secs = age.as_secs(),
                    max_age_secs = self.max_age.as_secs(),
                    skills = count,
                    "cached snapshot expired, re-fetching"
                );
                None
            }
            CacheStatus::Corrupt { reason } => {
                warn!(path = %self.path.display(), %reason, "ignoring corrupt cache");
                None
            }
            CacheStatus::Missing => {
                debug!(path = %self.path.display(), "no cached snapshot");
                None
            }
        }
    }

    /// Persist `skills` stamped with the current time.
    pub fn save(&self, skills: &[Skill]) -> Result<()> {
        self.save_at(skills, SystemTime::now())
    }

    /// Persist `skills` stamped with `now`.
    pub fn save_at(&self, skills: &[Skill], now: SystemTime) -> Result<()> {
        let timestamp = now
            .duration_since(UNIX_EPOCH)
            .map_err(|e| SkillscopeError::Cache(format!("system clock before epoch: {e}")))?
            .as_secs_f64();

        // Borrowing serializer so the skill list is not cloned.
        #[derive(Serialize)]
        struct SnapshotRef<'a> {
            timestamp: f64,
            skills: &'a [Skill],
        }

        let bytes = serde_json::to_vec(&SnapshotRef { timestamp, skills })
            .map_err(|e| SkillscopeError::Cache(format!("failed to serialize snapshot: {e}")))?;

        write_atomic(&self.path, &bytes)?;
        info!(path = %self.path.display(), skills = skills.len(), "cached snapshot");
        Ok(())
    }

    /// Remove the snapshot. Returns whether one existed.
    pub fn clear(&self) -> Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(SkillscopeError::io(&self.path, e)),
        }
    }
}

/// Age of a snapshot taken at `timestamp` (unix secs), clamped at zero for
/// timestamps in the future. `None` for non-finite timestamps or ages too
/// large to represent.
fn snapshot_age(timestamp: f64, now: SystemTime) -> Option<Duration> {
    if !timestamp.is_finite() {
        return None;
    }
    let now_secs = now.duration_since(UNIX_EPOCH).ok()?.as_secs_f64();
    Duration::try_from_secs_f64((now_secs - timestamp).max(0.0)).ok()
}
