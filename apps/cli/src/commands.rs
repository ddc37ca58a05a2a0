//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use prospector_cache::CacheStore;
use prospector_core::{AnalysisRun, ProgressReporter, Report, build_report, run_analysis};
use prospector_scoring::Scorer;
use prospector_shared::{
    AppConfig, HarvestConfig, Target, cache_db_path, config_file_path, init_config, load_config,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Prospector — harvest and score organization websites.
#[derive(Parser)]
#[command(
    name = "prospector",
    version,
    about = "Harvest organization websites and score their relevance on a fixed taxonomy.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
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
    /// Run the harvest-and-score pipeline over a target file.
    Run {
        /// JSON file with the target list.
        #[arg(short, long)]
        input: PathBuf,

        /// Write the full JSON report here (stdout summary is always printed).
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Analyze only the first N targets.
        #[arg(short, long)]
        limit: Option<usize>,

        /// Override the configured concurrency cap.
        #[arg(short, long)]
        concurrency: Option<usize>,
    },

    /// Fetch-cache management.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Cache subcommands.
#[derive(Subcommand)]
pub(crate) enum CacheAction {
    /// Show the number of cached pages.
    Stats,
    /// Delete every cached page.
    Clear,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
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
        0 => "prospector=info",
        1 => "prospector=debug",
        _ => "prospector=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run {
            input,
            output,
            limit,
            concurrency,
        } => cmd_run(input, output, limit, concurrency).await,
        Command::Cache { action } => cmd_cache(action).await,
        Command::Config { action } => cmd_config(action),
    }
}

async fn cmd_run(
    input: PathBuf,
    output: Option<PathBuf>,
    limit: Option<usize>,
    concurrency: Option<usize>,
) -> Result<()> {
    let config = load_config()?;

    let mut harvest = HarvestConfig::from(&config);
    if let Some(cap) = concurrency {
        harvest.concurrency = cap;
    }

    let targets = load_targets(&input, limit)?;
    info!(targets = targets.len(), input = %input.display(), "loaded targets");

    let cache = Arc::new(open_cache(&config).await?);
    let scorer = Scorer::from_config(&config)?;

    let progress = BarProgress::new(targets.len() as u64);
    let run = run_analysis(&harvest, &targets, &cache, &scorer, &progress).await?;

    let report = build_report(&run);
    print_top(&report, 10);

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&path, json)
            .wrap_err_with(|| format!("failed to write report to {}", path.display()))?;
        println!("\nFull report written to {}", path.display());
    }

    Ok(())
}

async fn cmd_cache(action: CacheAction) -> Result<()> {
    let config = load_config()?;
    let cache = open_cache(&config).await?;

    match action {
        CacheAction::Stats => {
            let entries = cache.len().await?;
            println!("Cached pages: {entries} (TTL {} days)", config.cache.ttl_days);
        }
        CacheAction::Clear => {
            let removed = cache.clear().await?;
            println!("Removed {removed} cached pages.");
        }
    }
    Ok(())
}

fn cmd_config(action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Init => {
            let path = init_config()?;
            println!("Config written to {}", path.display());
        }
        ConfigAction::Show => {
            let config = load_config()?;
            println!("# {}", config_file_path()?.display());
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Load targets from a JSON array file, applying the optional limit.
fn load_targets(path: &PathBuf, limit: Option<usize>) -> Result<Vec<Target>> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read target file {}", path.display()))?;

    let mut targets: Vec<Target> = serde_json::from_str(&content)
        .wrap_err_with(|| format!("invalid target JSON in {}", path.display()))?;

    if let Some(limit) = limit {
        targets.truncate(limit);
    }
    Ok(targets)
}

async fn open_cache(config: &AppConfig) -> Result<CacheStore> {
    let path = cache_db_path(config)?;
    let ttl = chrono::Duration::days(i64::from(config.cache.ttl_days));
    Ok(CacheStore::open(&path, ttl).await?)
}

/// Print the highest-scoring records to stdout.
fn print_top(report: &Report, top_n: usize) {
    println!("\nTop {} of {} targets:", top_n.min(report.results.len()), report.results.len());
    println!("{:-<72}", "");

    for (i, record) in report.results.iter().take(top_n).enumerate() {
        let tags: Vec<&str> = record.score.tags.iter().map(String::as_str).collect();
        println!(
            "{:>2}. {:<32} {:>5.1}/100  [{}]",
            i + 1,
            record.target.name,
            record.score.total_score,
            record.outcome.status,
        );
        if !tags.is_empty() {
            println!("    tags: {}", tags.join(", "));
        }
    }

    let stats = &report.metadata.fetch_stats;
    println!("{:-<72}", "");
    println!(
        "fetched: {}  cached: {}  failed: {}  timeout: {}  exception: {}  avg score: {:.1}",
        stats.success,
        stats.cached,
        stats.failed,
        stats.timeout,
        stats.exception,
        report.summary.average_score,
    );
}

// ---------------------------------------------------------------------------
// Progress bar
// ---------------------------------------------------------------------------

/// indicatif-backed progress reporter for interactive runs.
struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new(total: u64) -> Self {
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::with_template("{msg:<24} [{bar:40}] {pos}/{len}")
                .unwrap()
                .progress_chars("=> "),
        );
        Self { bar }
    }
}

impl ProgressReporter for BarProgress {
    fn phase(&self, name: &str) {
        self.bar.set_message(name.to_string());
    }

    fn target_scored(&self, _name: &str, current: usize, _total: usize) {
        self.bar.set_position(current as u64);
    }

    fn done(&self, _run: &AnalysisRun) {
        self.bar.finish_with_message("done");
    }
}
