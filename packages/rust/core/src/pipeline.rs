//! End-to-end `build` pipeline: cache check → fetch → merge → persist → aggregate.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use skillscope_fetcher::{SEARCH_QUERIES, SkillSource};
use skillscope_shared::{FetchConfig, PublisherAggregate, Result, Skill, SkillscopeError};
use skillscope_storage::CacheStore;

use crate::aggregate::aggregate;
use crate::collector::{Collector, MergeStats, sort_by_installs};

/// Pipeline states, in the order a successful run visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    CheckCache,
    CacheHit,
    CacheMiss,
    Fetching,
    Merging,
    Persisting,
    Aggregating,
    Done,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::CheckCache => "Checking cache",
            Self::CacheHit => "Using cached snapshot",
            Self::CacheMiss => "Cache miss",
            Self::Fetching => "Fetching skills",
            Self::Merging => "Merging batches",
            Self::Persisting => "Writing cache",
            Self::Aggregating => "Aggregating publishers",
            Self::Done => "Done",
            Self::Failed => "Failed",
        };
        f.write_str(label)
    }
}

/// Options for [`run_pipeline`].
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Search terms, merged in this order.
    pub queries: Vec<String>,
    /// Result limit per query.
    pub limit: u32,
    /// Maximum in-flight queries.
    pub concurrency: usize,
    /// Read the cache before fetching. The result is persisted either way.
    pub use_cache: bool,
}

impl PipelineOptions {
    /// The built-in query plan with limits taken from `fetch`.
    pub fn from_fetch_config(fetch: &FetchConfig) -> Self {
        Self {
            queries: SEARCH_QUERIES.iter().map(|q| (*q).to_string()).collect(),
            limit: fetch.limit,
            concurrency: fetch.concurrency.max(1),
            use_cache: true,
        }
    }
}

/// Where the pipeline's skills came from.
#[derive(Debug, Clone, PartialEq)]
pub enum DataOrigin {
    /// A fresh snapshot of the given age.
    Cache { age: Duration },
    /// A full fetch over this many queries.
    Fetched { queries: usize },
}

/// Result of a successful pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Deduplicated skills, installs descending.
    pub skills: Vec<Skill>,
    /// Publisher aggregates, total installs descending.
    pub publishers: Vec<PublisherAggregate>,
    pub origin: DataOrigin,
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called on every state transition.
    fn state(&self, state: PipelineState);
    /// Called after each query's batch is merged.
    fn query_merged(&self, query: &str, stats: &MergeStats, index: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, output: &PipelineOutput);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn state(&self, _state: PipelineState) {}
    fn query_merged(&self, _query: &str, _stats: &MergeStats, _index: usize, _total: usize) {}
    fn done(&self, _output: &PipelineOutput) {}
}

fn enter(progress: &dyn ProgressReporter, state: PipelineState) {
    debug!(%state, "pipeline state");
    progress.state(state);
}

/// Run the full `build` pipeline.
///
/// 1. Check the cache (unless `use_cache` is off)
/// 2. Fetch every query concurrently, bounded by `concurrency`
/// 3. Merge batches in query order
/// 4. Persist the snapshot (failures here are logged, not fatal)
/// 5. Aggregate publishers
///
/// A fetch failure ends the run before anything is persisted.
#[instrument(skip_all, fields(queries = options.queries.len(), use_cache = options.use_cache))]
pub async fn run_pipeline<S>(
    source: Arc<S>,
    cache: &CacheStore,
    options: &PipelineOptions,
    progress: &dyn ProgressReporter,
) -> Result<PipelineOutput>
where
    S: SkillSource + 'static,
{
    let start = Instant::now();

    // --- Cache ---
    let cached = if options.use_cache {
        enter(progress, PipelineState::CheckCache);
        cache.load()
    } else {
        debug!("cache read disabled");
        None
    };

    let (skills, origin) = match cached {
        Some((mut skills, age)) => {
            enter(progress, PipelineState::CacheHit);
            sort_by_installs(&mut skills);
            (skills, DataOrigin::Cache { age })
        }
        None => {
            enter(progress, PipelineState::CacheMiss);
            let skills = match fetch_all(source, options, progress).await {
                Ok(skills) => skills,
                Err(e) => {
                    enter(progress, PipelineState::Failed);
                    return Err(e);
                }
            };

            enter(progress, PipelineState::Persisting);
            if let Err(e) = cache.save(&skills) {
                warn!(error = %e, path = %cache.path().display(), "failed to write cache");
            }

            (
                skills,
                DataOrigin::Fetched {
                    queries: options.queries.len(),
                },
            )
        }
    };

    // --- Aggregate ---
    enter(progress, PipelineState::Aggregating);
    let publishers = aggregate(&skills);

    let output = PipelineOutput {
        skills,
        publishers,
        origin,
        elapsed: start.elapsed(),
    };

    info!(
        skills = output.skills.len(),
        publishers = output.publishers.len(),
        elapsed_ms = output.elapsed.as_millis() as u64,
        "pipeline complete"
    );

    enter(progress, PipelineState::Done);
    progress.done(&output);
    Ok(output)
}

/// Fetch every query and fold the batches in query order.
async fn fetch_all<S>(
    source: Arc<S>,
    options: &PipelineOptions,
    progress: &dyn ProgressReporter,
) -> Result<Vec<Skill>>
where
    S: SkillSource + 'static,
{
    enter(progress, PipelineState::Fetching);
    info!(
        queries = options.queries.len(),
        concurrency = options.concurrency,
        limit = options.limit,
        "starting fetch"
    );

    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let mut handles: Vec<(String, JoinHandle<Result<Vec<Skill>>>)> =
        Vec::with_capacity(options.queries.len());

    for query in &options.queries {
        let source = source.clone();
        let sem = semaphore.clone();
        let query_owned = query.clone();
        let limit = options.limit;

        handles.push((
            query.clone(),
            tokio::spawn(async move {
                let _permit = sem.acquire_owned().await.map_err(|e| {
                    SkillscopeError::fetch(&query_owned, 0, format!("fetch slot unavailable: {e}"))
                })?;
                source.search(&query_owned, limit).await
            }),
        ));
    }

    enter(progress, PipelineState::Merging);
    let total = handles.len();
    let mut collector = Collector::new();
    let mut pending = handles.into_iter();
    let mut index = 0;

    // Awaited in query order; a failure aborts everything still queued.
    while let Some((query, handle)) = pending.next() {
        index += 1;
        let batch = match handle.await {
            Ok(Ok(batch)) => batch,
            Ok(Err(e)) => {
                abort_remaining(pending);
                return Err(e);
            }
            Err(e) => {
                abort_remaining(pending);
                return Err(SkillscopeError::fetch(
                    query,
                    0,
                    format!("fetch task failed: {e}"),
                ));
            }
        };

        let stats = collector.merge(batch);
        info!(
            query = %query,
            fetched = stats.fetched,
            added = stats.added,
            total = stats.total,
            "merged query"
        );
        progress.query_merged(&query, &stats, index, total);
    }

    Ok(collector.into_sorted())
}

fn abort_remaining(pending: impl Iterator<Item = (String, JoinHandle<Result<Vec<Skill>>>)>) {
    for (query, handle) in pending {
        debug!(query = %query, "aborting fetch");
        handle.abort();
    }
}
