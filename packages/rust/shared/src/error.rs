//! Error types for skillscope.
//!
//! Library crates use [`SkillscopeError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all skillscope operations.
#[derive(Debug, thiserror::Error)]
pub enum SkillscopeError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A search query failed on every attempt.
    #[error("fetch failed for q={query} after {attempts} attempt(s): {message}")]
    Fetch {
        query: String,
        attempts: u32,
        message: String,
    },

    /// The API answered, but the body was not the expected JSON shape.
    #[error("decode error for q={query}: {message}")]
    Decode { query: String, message: String },

    /// Snapshot persistence error (reads never produce this; corrupt reads are misses).
    #[error("cache error: {0}")]
    Cache(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Report rendering or export error.
    #[error("render error: {0}")]
    Render(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SkillscopeError>;

impl SkillscopeError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a fatal fetch error for `query`.
    pub fn fetch(query: impl Into<String>, attempts: u32, msg: impl Into<String>) -> Self {
        Self::Fetch {
            query: query.into(),
            attempts,
            message: msg.into(),
        }
    }

    /// Create a decode error for `query`.
    pub fn decode(query: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Decode {
            query: query.into(),
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
