//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use skillscope_artifacts::{export_json, render_dashboard, write_dashboard};
use skillscope_core::collector::MergeStats;
use skillscope_core::pipeline::{
    DataOrigin, PipelineOptions, PipelineOutput, PipelineState, ProgressReporter, run_pipeline,
};
use skillscope_core::summary::DatasetSummary;
use skillscope_fetcher::SearchClient;
use skillscope_shared::{
    AppConfig, CacheConfig, FetchConfig, config_file_path, init_config_at, load_config,
    load_config_from,
};
use skillscope_storage::{CacheStatus, CacheStore};
use skillscope_validator::validate_dir;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// skillscope: snapshot the skills.sh catalog and chart its publishers.
#[derive(Parser)]
#[command(
    name = "skillscope",
    version,
    about = "Fetch the skills.sh catalog, aggregate it by publisher, and render a dashboard.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.skillscope/skillscope.toml).
    #[arg(long, global = true, env = "SKILLSCOPE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch (or reuse the cached) catalog, print a summary, and write the dashboard.
    Build {
        /// Output HTML path.
        #[arg(short, long, default_value = "index.html")]
        output: PathBuf,

        /// Also write skills_raw.json and skills_owners.json next to the output.
        #[arg(long)]
        json: bool,

        /// Ignore the cached snapshot and fetch fresh data.
        #[arg(long)]
        no_cache: bool,
    },

    /// Validate local skill bundles.
    Validate {
        /// Directory containing one subdirectory per skill.
        #[arg(default_value = "skills")]
        dir: PathBuf,
    },

    /// Inspect or drop the cached snapshot.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Cache subcommands.
#[derive(Subcommand)]
pub(crate) enum CacheAction {
    /// Show the snapshot location, age, and size.
    Show,
    /// Delete the snapshot.
    Clear,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "skillscope=info",
        1 => "skillscope=debug",
        _ => "skillscope=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Build {
            output,
            json,
            no_cache,
        } => cmd_build(config_path, &output, json, no_cache).await,
        Command::Validate { dir } => cmd_validate(&dir),
        Command::Cache { action } => match action {
            CacheAction::Show => cmd_cache_show(config_path),
            CacheAction::Clear => cmd_cache_clear(config_path),
        },
        Command::Config { action } => match action {
            ConfigAction::Init { force } => cmd_config_init(config_path, force),
            ConfigAction::Show => cmd_config_show(config_path),
        },
    }
}

/// Load the config from `--config`, or the default location.
fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

fn cache_store(config: &AppConfig) -> Result<CacheStore> {
    Ok(CacheStore::new(&CacheConfig::resolve(config)?))
}

// ---------------------------------------------------------------------------
// build
// ---------------------------------------------------------------------------

async fn cmd_build(
    config_path: Option<&Path>,
    output: &Path,
    json: bool,
    no_cache: bool,
) -> Result<()> {
    let config = load(config_path)?;
    let fetch = FetchConfig::from(&config);
    let cache = cache_store(&config)?;

    let mut options = PipelineOptions::from_fetch_config(&fetch);
    options.use_cache = !no_cache;

    info!(
        base_url = %fetch.base_url,
        queries = options.queries.len(),
        cache = %cache.path().display(),
        no_cache,
        "building dashboard"
    );

    let source = Arc::new(SearchClient::new(fetch)?);
    let reporter = CliProgress::new()?;
    let result = run_pipeline(source, &cache, &options, &reporter).await?;

    println!();
    println!("{}", DatasetSummary::from_output(&result));

    match &result.origin {
        DataOrigin::Cache { age } => {
            println!("  Source: cache ({}s old)", age.as_secs())
        }
        DataOrigin::Fetched { queries } => println!("  Source: {queries} queries"),
    }
    println!("  Time:   {:.1}s", result.elapsed.as_secs_f64());

    if json {
        let dir = match output.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let export = export_json(dir, &result.skills, &result.publishers)?;
        println!(
            "  JSON:   {}, {}",
            export.skills_path.display(),
            export.owners_path.display()
        );
    }

    let as_of = chrono::Local::now().date_naive();
    let html = render_dashboard(&result.skills, &result.publishers, as_of, config.report.top_n)?;
    let bytes = write_dashboard(output, &html)?;
    println!("  Dashboard written to: {} ({bytes} bytes)", output.display());
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Result<Self> {
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .map_err(|e| eyre!("invalid progress template: {e}"))?
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);

        let spinner = ProgressBar::new_spinner();
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Ok(Self { spinner })
    }
}

impl ProgressReporter for CliProgress {
    fn state(&self, state: PipelineState) {
        match state {
            PipelineState::Failed => self.spinner.finish_and_clear(),
            _ => self.spinner.set_message(state.to_string()),
        }
    }

    fn query_merged(&self, query: &str, stats: &MergeStats, index: usize, total: usize) {
        self.spinner.set_message(format!(
            "Fetching [{index}/{total}] q={query}: +{} new, {} total",
            stats.added, stats.total
        ));
    }

    fn done(&self, _output: &PipelineOutput) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn cmd_validate(dir: &Path) -> Result<()> {
    let report = validate_dir(dir)?;

    if !report.is_valid() {
        eprintln!("Skill validation failed:");
        for violation in &report.violations {
            eprintln!("- {violation}");
        }
        return Err(eyre!(
            "{} violation(s) in {}",
            report.violations.len(),
            dir.display()
        ));
    }

    println!("Validated {} skill(s) successfully.", report.bundles.len());
    Ok(())
}

// ---------------------------------------------------------------------------
// cache
// ---------------------------------------------------------------------------

fn cmd_cache_show(config_path: Option<&Path>) -> Result<()> {
    let config = load(config_path)?;
    let cache = cache_store(&config)?;

    println!("Path:    {}", cache.path().display());
    println!("Max age: {}s", cache.max_age().as_secs());
    match cache.inspect() {
        CacheStatus::Missing => println!("Status:  missing"),
        CacheStatus::Corrupt { reason } => println!("Status:  corrupt ({reason})"),
        CacheStatus::Expired { age, count } => {
            println!("Status:  expired ({}s old, {count} skills)", age.as_secs())
        }
        CacheStatus::Fresh { age, skills } => {
            println!("Status:  fresh ({}s old, {} skills)", age.as_secs(), skills.len())
        }
    }
    Ok(())
}

fn cmd_cache_clear(config_path: Option<&Path>) -> Result<()> {
    let config = load(config_path)?;
    let cache = cache_store(&config)?;

    if cache.clear()? {
        println!("Removed {}", cache.path().display());
    } else {
        println!("No snapshot at {}", cache.path().display());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

fn cmd_config_init(config_path: Option<&Path>, force: bool) -> Result<()> {
    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => config_file_path()?,
    };

    if path.exists() && !force {
        return Err(eyre!(
            "config already exists at '{}' (use --force to overwrite)",
            path.display()
        ));
    }

    init_config_at(&path)?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = load(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_defaults() {
        let cli = Cli::try_parse_from(["skillscope", "build"]).unwrap();
        match cli.command {
            Command::Build {
                output,
                json,
                no_cache,
            } => {
                assert_eq!(output, PathBuf::from("index.html"));
                assert!(!json);
                assert!(!no_cache);
            }
            _ => panic!("expected build"),
        }
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn build_flags_and_globals() {
        let cli = Cli::try_parse_from([
            "skillscope",
            "build",
            "-o",
            "out/dash.html",
            "--json",
            "--no-cache",
            "-vv",
            "--log-format",
            "json",
            "--config",
            "alt.toml",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.log_format, LogFormat::Json));
        assert_eq!(cli.config, Some(PathBuf::from("alt.toml")));
        assert!(matches!(
            cli.command,
            Command::Build { json: true, no_cache: true, .. }
        ));
    }

    #[test]
    fn validate_defaults_to_skills_dir() {
        let cli = Cli::try_parse_from(["skillscope", "validate"]).unwrap();
        assert!(matches!(cli.command, Command::Validate { ref dir } if dir == Path::new("skills")));
    }

    #[test]
    fn cache_and_config_subcommands() {
        let cli = Cli::try_parse_from(["skillscope", "cache", "clear"]).unwrap();
        assert!(matches!(cli.command, Command::Cache { action: CacheAction::Clear }));

        let cli = Cli::try_parse_from(["skillscope", "config", "init", "--force"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config { action: ConfigAction::Init { force: true } }
        ));
    }

    #[test]
    fn unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["skillscope", "crawl"]).is_err());
    }
}
