//! Core pipeline orchestration and domain logic for skillscope.
//!
//! This crate ties together the search client, the snapshot cache, the
//! deduplicating collector, and the publisher aggregator into one end-to-end
//! run (see [`pipeline::run_pipeline`]).

pub mod aggregate;
pub mod collector;
pub mod pipeline;
pub mod summary;
