//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use linkenrich_classifier::{Classifier, Classify, create_provider};
use linkenrich_core::{
    PipelineObserver, PipelineSettings, RecordOutcome, RecordStatus, RunSummary,
};
use linkenrich_shared::{
    AppConfig, ClassificationSource, ModelSettings, RunConfig, StoreSettings, init_config,
    load_config, load_config_from,
};
use linkenrich_store::{NotionStore, RecordStore};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// linkenrich - fill in titles, categories and summaries for saved links.
#[derive(Parser)]
#[command(
    name = "linkenrich",
    version,
    about = "Classify and summarize unprocessed links in a Notion database.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.linkenrich/linkenrich.toml).
    #[arg(long, global = true, env = "LINKENRICH_CONFIG")]
    pub config: Option<PathBuf>,

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
    /// Enrich every record whose title or notes is empty.
    Run,

    /// Classify one URL with the configured model without touching the store.
    Classify {
        /// URL to classify.
        url: String,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List records that still need enrichment.
    Pending,

    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show the file configuration (secrets are never stored there).
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "linkenrich=info",
        1 => "linkenrich=debug",
        _ => "linkenrich=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

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
    match cli.command {
        Command::Run => cmd_run(&load(&cli.config)?).await,
        Command::Classify { url, json } => cmd_classify(&load(&cli.config)?, &url, json).await,
        Command::Pending => cmd_pending(&load(&cli.config)?).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&load(&cli.config)?),
        },
    }
}

fn load(path: &Option<PathBuf>) -> Result<AppConfig> {
    Ok(match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    })
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(config: &AppConfig) -> Result<()> {
    // Validate every credential before any client exists.
    let run_config = RunConfig::resolve(config)?;

    let store = NotionStore::new(&run_config.store)?;
    let classifier = Classifier::new(create_provider(&run_config.model)?);
    let settings = PipelineSettings {
        delay: run_config.delay,
    };

    info!(
        provider = classifier.provider_name(),
        model = %run_config.model.model,
        delay_ms = run_config.delay.as_millis() as u64,
        "starting run"
    );

    let observer = CliObserver::new();
    let summary = linkenrich_core::run(&store, &classifier, &settings, &observer).await;

    print_summary(&summary);
    Ok(())
}

async fn cmd_classify(config: &AppConfig, url: &str, json: bool) -> Result<()> {
    let settings = ModelSettings::resolve_with(&config.model, env_lookup)?;
    let classifier = Classifier::new(create_provider(&settings)?);

    let result = classifier.classify(url).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!();
    println!("  Title:    {}", result.title);
    println!("  Category: {}", result.category);
    println!("  Type:     {}", result.content_type);
    println!("  Notes:    {}", result.notes);
    if result.source == ClassificationSource::Fallback {
        println!("  (model unavailable, fallback values shown)");
    }
    println!();
    Ok(())
}

async fn cmd_pending(config: &AppConfig) -> Result<()> {
    let settings = StoreSettings::resolve_with(&config.store, env_lookup)?;
    let store = NotionStore::new(&settings)?;

    // Surface query failures here instead of reporting an empty list.
    let records = store.try_list_unprocessed().await?;

    if records.is_empty() {
        println!("No unprocessed records.");
        return Ok(());
    }

    println!("{} unprocessed record(s):", records.len());
    for record in &records {
        let url = store
            .extract_url(record)
            .unwrap_or_else(|| "(no usable URL)".to_string());
        println!("  {}  {url}", record.id);
    }
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    if summary.total == 0 {
        println!("No unprocessed records.");
        return;
    }

    let elapsed = summary.finished_at - summary.started_at;

    println!();
    println!("  Run complete");
    println!("  Started:   {}", summary.started_at.format("%Y-%m-%d %H:%M:%S"));
    println!("  Finished:  {}", summary.finished_at.format("%Y-%m-%d %H:%M:%S"));
    println!("  Total:     {}", summary.total);
    println!("  Succeeded: {}", summary.succeeded);
    println!("  Failed:    {}", summary.failed);
    if summary.fallbacks > 0 {
        println!("  Fallbacks: {} (updated without model output)", summary.fallbacks);
    }
    println!("  Time:      {:.1}s", elapsed.num_milliseconds() as f64 / 1000.0);
    println!();
}

// ---------------------------------------------------------------------------
// CLI observer
// ---------------------------------------------------------------------------

/// Progress bar over the snapshot, with per-record failures printed above it.
struct CliObserver {
    bar: ProgressBar,
}

impl CliObserver {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template("{spinner:.cyan} [{pos}/{len}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        bar.set_style(style);
        Self { bar }
    }
}

impl PipelineObserver for CliObserver {
    fn run_started(&self, total: usize) {
        self.bar.set_length(total as u64);
        if total > 0 {
            self.bar.enable_steady_tick(std::time::Duration::from_millis(80));
        }
    }

    fn record_started(&self, _index: usize, _total: usize, record_id: &str, url: Option<&str>) {
        self.bar
            .set_message(format!("{record_id} {}", url.unwrap_or("(no URL)")));
    }

    fn record_finished(&self, outcome: &RecordOutcome) {
        self.bar.inc(1);
        match &outcome.status {
            RecordStatus::Updated { title, source, .. } => {
                let marker = match source {
                    ClassificationSource::Model => "ok",
                    ClassificationSource::Fallback => "ok (fallback)",
                };
                self.bar
                    .println(format!("  [{}/{}] {marker}: {title}", outcome.index, outcome.total));
            }
            RecordStatus::MissingUrl => {
                self.bar.println(format!(
                    "  [{}/{}] skipped {}: no URL",
                    outcome.index, outcome.total, outcome.record_id
                ));
            }
            RecordStatus::UpdateFailed { error } => {
                self.bar.println(format!(
                    "  [{}/{}] failed {}: {error}",
                    outcome.index, outcome.total, outcome.record_id
                ));
            }
        }
    }

    fn run_finished(&self, _summary: &RunSummary) {
        self.bar.finish_and_clear();
    }
}
