//! Awaaz daemon entry point.
//!
//! Reads a JSON-lines notification feed (stdin by default, or a file/FIFO
//! supplied with `--feed`), announces classified payments through the
//! speech pipeline, and records them to local SQLite history.

mod feed;
mod settings;
mod storage;

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use awaaz_core::speech::stub::StubSynthesizer;
use awaaz_core::{AnnouncePipeline, AudioFocusCoordinator, SpeechConfig, SynthHandle};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use settings::{load_settings, save_settings};
use storage::{spawn_recorder, PaymentStore};

#[derive(Debug, Parser)]
#[command(name = "awaaz", about = "UPI payment announcement daemon")]
struct Cli {
    /// Notification feed to consume (JSON lines). Defaults to stdin.
    #[arg(long)]
    feed: Option<PathBuf>,

    /// SQLite payment history database.
    #[arg(long, default_value = "awaaz.db3")]
    db: PathBuf,

    /// Settings file (JSON). Missing file means defaults.
    #[arg(long, default_value = "awaaz-settings.json")]
    settings: PathBuf,

    /// Override the configured announcement language ("en" or "hi").
    #[arg(long)]
    language: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let mut settings = load_settings(&cli.settings);
    if let Some(language) = &cli.language {
        settings.language = language
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))
            .context("invalid --language")?;
    }
    if !cli.settings.exists() {
        // Bootstrap a template the user can edit.
        if let Err(e) = save_settings(&cli.settings, &settings) {
            warn!("could not write default settings file: {e}");
        }
    }
    info!(
        language = ?settings.language,
        announcements_enabled = settings.announcements_enabled,
        "settings loaded"
    );

    let store = PaymentStore::open(&cli.db)?;
    let recorder = spawn_recorder(store);

    // One synthesizer instance for the process lifetime. The stub backend
    // records utterances; a platform voice backend plugs in through the
    // same SynthHandle.
    let pipeline = AnnouncePipeline::start(
        SynthHandle::new(StubSynthesizer::new()),
        Arc::new(AudioFocusCoordinator::default()),
        SpeechConfig::default(),
    );

    // Forward engine status transitions into the log.
    let mut status_rx = pipeline.subscribe_status();
    std::thread::Builder::new()
        .name("awaaz-status-log".into())
        .spawn(move || {
            while let Ok(event) = status_rx.blocking_recv() {
                info!(status = ?event.status, detail = ?event.detail, "engine status");
            }
        })
        .expect("spawn status log thread");

    let stats = match &cli.feed {
        Some(path) => {
            info!(feed = %path.display(), "consuming notification feed");
            let file = File::open(path).with_context(|| format!("opening feed {path:?}"))?;
            feed::run_feed(BufReader::new(file), &pipeline, &recorder, &settings)?
        }
        None => {
            info!("consuming notification feed from stdin");
            let stdin = io::stdin();
            feed::run_feed(stdin.lock(), &pipeline, &recorder, &settings)?
        }
    };

    info!(
        lines = stats.lines,
        classified = stats.classified,
        announced = stats.announced,
        filtered = stats.filtered,
        malformed = stats.malformed,
        "feed ended, shutting down"
    );

    recorder.shutdown();
    pipeline.shutdown()?;
    Ok(())
}
