//! Application configuration for skillscope.
//!
//! User config lives at `~/.skillscope/skillscope.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SkillscopeError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "skillscope.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".skillscope";

/// Subdirectory of the user cache dir holding the snapshot.
const CACHE_DIR_NAME: &str = "skillscope";

/// Snapshot file name.
const CACHE_FILE_NAME: &str = "skills_cache.json";

// ---------------------------------------------------------------------------
// Config structs (matching skillscope.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Remote search API.
    #[serde(default)]
    pub api: ApiConfig,

    /// Retry and concurrency policy.
    #[serde(default)]
    pub fetch: FetchSection,

    /// Snapshot location and freshness.
    #[serde(default)]
    pub cache: CacheSection,

    /// Report output.
    #[serde(default)]
    pub report: ReportConfig,
}

/// `[api]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL; requests go to `<base_url>/search`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Result limit sent with every query.
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            limit: default_limit(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_base_url() -> String {
    "https://skills.sh/api".into()
}
fn default_limit() -> u32 {
    100_000
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_user_agent() -> String {
    concat!("skillscope/", env!("CARGO_PKG_VERSION")).into()
}

/// `[fetch]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchSection {
    /// Attempts per query, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry; doubles on each further retry.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Maximum queries in flight.
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,
}

impl Default for FetchSection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    1_000
}
fn default_concurrency() -> u32 {
    4
}

/// `[cache]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSection {
    /// Override for the snapshot directory (defaults to the user cache dir).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,

    /// Freshness window in seconds.
    #[serde(default = "default_max_age_secs")]
    pub max_age_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            dir: None,
            max_age_secs: default_max_age_secs(),
        }
    }
}

fn default_max_age_secs() -> u64 {
    3_600
}

/// `[report]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// How many skills and publishers the dashboard embeds.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
        }
    }
}

fn default_top_n() -> usize {
    50
}

// ---------------------------------------------------------------------------
// Runtime configs (merged from config file + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime fetch configuration.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub base_url: String,
    pub limit: u32,
    pub timeout: Duration,
    pub user_agent: String,
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub concurrency: usize,
}

impl FetchConfig {
    /// Backoff before retry number `attempt` (0-based): `base_delay * 2^attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            base_url: config.api.base_url.clone(),
            limit: config.api.limit,
            timeout: Duration::from_secs(config.api.timeout_secs),
            user_agent: config.api.user_agent.clone(),
            max_attempts: config.fetch.max_attempts.max(1),
            base_delay: Duration::from_millis(config.fetch.base_delay_ms),
            concurrency: (config.fetch.concurrency as usize).max(1),
        }
    }
}

/// Runtime cache configuration with a resolved snapshot path.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Full path of the snapshot file.
    pub path: PathBuf,
    /// Freshness window.
    pub max_age: Duration,
}

impl CacheConfig {
    /// Resolve the snapshot path from config, falling back to the user cache dir.
    pub fn resolve(config: &AppConfig) -> Result<Self> {
        let dir = match &config.cache.dir {
            Some(dir) => PathBuf::from(dir),
            None => dirs::cache_dir()
                .ok_or_else(|| SkillscopeError::config("could not determine cache directory"))?
                .join(CACHE_DIR_NAME),
        };

        Ok(Self {
            path: dir.join(CACHE_FILE_NAME),
            max_age: Duration::from_secs(config.cache.max_age_secs),
        })
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.skillscope/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SkillscopeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.skillscope/skillscope.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SkillscopeError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        SkillscopeError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let path = config_file_path()?;
    init_config_at(&path)?;
    Ok(path)
}

/// Write a default config file at `path`, creating parent directories.
pub fn init_config_at(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| SkillscopeError::io(dir, e))?;
    }

    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| SkillscopeError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| SkillscopeError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(())
}
