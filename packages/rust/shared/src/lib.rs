//! Shared types, error model, and configuration for skillscope.
//!
//! This crate is the foundation depended on by all other skillscope crates.
//! It provides:
//! - [`SkillscopeError`]: the unified error type
//! - Domain types ([`Skill`], [`PublisherAggregate`], [`PublisherSkill`])
//! - Configuration ([`AppConfig`], [`FetchConfig`], [`CacheConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    ApiConfig, AppConfig, CacheConfig, CacheSection, FetchConfig, FetchSection, ReportConfig,
    config_dir, config_file_path, init_config, init_config_at, load_config, load_config_from,
};
pub use error::{Result, SkillscopeError};
pub use types::{PublisherAggregate, PublisherSkill, Skill, UNATTRIBUTED_OWNER};
