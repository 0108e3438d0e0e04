//! Search API client, retry policy, and the static query plan.
//!
//! This crate provides:
//! - [`SkillSource`]: the seam the pipeline fetches through
//! - [`SearchClient`]: reqwest-backed source with bounded retry and backoff
//! - [`query_plan`]: the ordered search terms that approximate full coverage

pub mod client;
pub mod query_plan;

pub use client::{SearchClient, SkillSource};
pub use query_plan::SEARCH_QUERIES;
