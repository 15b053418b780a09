use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod feed;
mod leaderboard;
mod models;
mod parse;
mod publish;
mod report;
mod store;
mod window;

use crate::config::Settings;
use crate::feed::{ScanMode, ThreadFeed};
use crate::publish::BlobPublisher;
use crate::store::SnapshotStore;
use crate::window::Window;

#[derive(Parser)]
#[command(name = "merit-leaderboard")]
#[command(about = "Builds merit leaderboards from the forum's merit snapshots", long_about = None)]
struct Cli {
    /// Optional TOML settings file
    #[arg(long, global = true, default_value = "merit.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the merit thread, build the leaderboard and upload it
    Build {
        #[arg(long, value_enum, default_value_t = ScanMode::Update)]
        mode: ScanMode,
        /// Skip the upload; no token is needed
        #[arg(long)]
        dry_run: bool,
        /// Also write the leaderboard JSON here
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Build the leaderboard from merit files in a local directory
    Import {
        #[arg(long)]
        dir: PathBuf,
        #[arg(long)]
        dry_run: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Generate a markdown report from a leaderboard JSON file
    Report {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Export one window of a leaderboard JSON file as CSV
    Export {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, value_enum, default_value_t = Window::Month)]
        window: Window,
        #[arg(long, default_value = "leaderboard.csv")]
        out: PathBuf,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,merit_leaderboard=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    let settings = Settings::load(&cli.config)
        .with_context(|| format!("failed to load settings from {}", cli.config.display()))?;

    match cli.command {
        Commands::Build { mode, dry_run, out } => {
            let publisher = publisher(&settings, dry_run)?;
            let feed = ThreadFeed::new(&settings.forum)?;
            let store = feed
                .collect(mode, Utc::now().date_naive())
                .await
                .context("failed to scan the merit thread")?;
            finish(&settings, &store, publisher.as_ref(), out.as_deref()).await?;
        }
        Commands::Import { dir, dry_run, out } => {
            let publisher = publisher(&settings, dry_run)?;
            let store = feed::load_directory(&dir)
                .with_context(|| format!("failed to read merit files from {}", dir.display()))?;
            finish(&settings, &store, publisher.as_ref(), out.as_deref()).await?;
        }
        Commands::Report { input, out, limit } => {
            let result = publish::read_local(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let report = report::build_report(&result, limit);
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Export { input, window, out } => {
            let result = publish::read_local(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let rows = report::export_csv(&result, window, &out)?;
            println!("Exported {rows} {} entries to {}.", window.label(), out.display());
        }
    }

    Ok(())
}

/// The token check runs before any scraping so a missing credential aborts early.
fn publisher(settings: &Settings, dry_run: bool) -> anyhow::Result<Option<BlobPublisher>> {
    if dry_run {
        return Ok(None);
    }
    let publisher = BlobPublisher::new(&settings.blob).context("cannot upload the leaderboard")?;
    Ok(Some(publisher))
}

async fn finish(
    settings: &Settings,
    store: &SnapshotStore,
    publisher: Option<&BlobPublisher>,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    let Some(result) = leaderboard::build(store, settings.leaderboard.limit, Utc::now()) else {
        println!("No snapshots found to build a leaderboard.");
        return Ok(());
    };

    if let Some(path) = out {
        publish::write_local(path, &result)?;
        println!("Leaderboard written to {}.", path.display());
    }

    match publisher {
        Some(publisher) => match publisher.publish(&result).await {
            Ok(url) => println!("Leaderboard uploaded to {url}."),
            Err(err) => {
                error!(error = %err, "failed to upload leaderboard");
                return Err(err).context("upload failed");
            }
        },
        None => info!("dry run; skipping upload"),
    }

    Ok(())
}
