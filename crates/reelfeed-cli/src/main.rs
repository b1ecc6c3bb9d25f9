//! The `reelfeed` binary.
//!
//! Wires configuration, storage, providers and the scrape job together and
//! exposes the run modes: a single run, the interval scheduler, and a
//! couple of read-only views over the stored content.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use reelfeed_core::ContentKind;
use reelfeed_runtime::{
    IntervalScheduler, JobRegistry, NamedScrapeJob, NotificationSink, PageFetcher,
    ProviderOrchestrator, ProviderRegistry, RuntimeConfig, ScrapeJob, SqliteStore, StoredRecord,
    WebhookNotifier,
};

const JOB_NAME: &str = "content_scraper";

#[derive(Parser)]
#[command(name = "reelfeed", version, about = "Scrape, extract and store movie/series releases")]
struct Cli {
    /// Path to the YAML config file.
    #[arg(long, default_value = "reelfeed.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one scrape across all configured sources, then exit.
    Run,

    /// Keep running the scrape job on the configured interval.
    Watch,

    /// Show stored content counts.
    Stats,

    /// List stored content, newest first.
    List {
        /// Restrict to "movie" or "series".
        #[arg(long)]
        kind: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = RuntimeConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    if let Some(parent) = std::path::Path::new(&config.database).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating data directory {}", parent.display()))?;
        }
    }

    let store = Arc::new(
        SqliteStore::open(&config.database)
            .await
            .with_context(|| format!("opening database {}", config.database))?,
    );

    match cli.command {
        Command::Run => {
            let registry = build_registry(&config, store.clone())?;
            let report = registry.run_now(JOB_NAME, config.run_deadline).await?;
            println!(
                "{:?}: saved {} record(s) from {} source(s) ({} skipped)",
                report.status, report.records_saved, report.sources_total, report.sources_skipped
            );
        }
        Command::Watch => {
            let registry = Arc::new(build_registry(&config, store.clone())?);
            tracing::info!(
                every = ?config.run_every,
                deadline = ?config.run_deadline,
                "starting interval scheduler"
            );
            IntervalScheduler::new(registry, config.run_every, config.run_deadline)
                .run(JOB_NAME)
                .await?;
        }
        Command::Stats => {
            let stats = store.stats().await?;
            println!("Total content: {}", stats.total);
            println!("Movies: {}", stats.movies);
            println!("Series: {}", stats.series);
        }
        Command::List { kind } => {
            let records = match kind.as_deref() {
                Some(value) => {
                    let kind = ContentKind::parse(value)
                        .with_context(|| format!("invalid kind '{value}', expected movie or series"))?;
                    store.by_kind(kind).await?
                }
                None => store.all().await?,
            };

            for stored in &records {
                println!("{}", format_record(stored));
            }
            println!("{} record(s)", records.len());
        }
    }

    Ok(())
}

fn build_registry(config: &RuntimeConfig, store: Arc<SqliteStore>) -> anyhow::Result<JobRegistry> {
    let providers = config.build_providers(&ProviderRegistry::with_defaults());
    if providers.is_empty() {
        anyhow::bail!("no usable text-generation providers configured");
    }

    let sink: Option<Arc<dyn NotificationSink>> = match &config.webhook_url {
        Some(url) => Some(Arc::new(WebhookNotifier::new(url.clone())?)),
        None => {
            tracing::info!("notifications disabled: no webhook_url configured");
            None
        }
    };

    let job = ScrapeJob::new(
        Arc::new(PageFetcher::new()?),
        store,
        ProviderOrchestrator::new(providers),
        sink,
        config.sources.clone(),
    );

    let registry = JobRegistry::new();
    registry.register(Arc::new(NamedScrapeJob::new(JOB_NAME, job)))?;
    Ok(registry)
}

fn format_record(stored: &StoredRecord) -> String {
    let record = &stored.record;
    let year = record.year.map(|y| format!(" ({y})")).unwrap_or_default();
    let rating = record
        .rating
        .map(|r| format!(" {r}/10"))
        .unwrap_or_default();

    format!(
        "- {}{} [{}] {}{}",
        record.title, year, record.kind, record.category, rating
    )
}
