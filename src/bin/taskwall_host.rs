//! Headless display host.
//!
//! Loads the config, fetches the boards, then writes one [`WallFrame`] per
//! tick to stdout as newline-delimited JSON until interrupted. A renderer
//! reads that stream.
//!
//! All tracing/diagnostic output goes to stderr (and optionally a daily log
//! file) so that stdout remains a clean frame channel.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use taskwall::config::LoggingConfig;
use taskwall::wall::WallFrame;
use taskwall::{RefreshMode, SelectionStore, TaskWall, WallConfig};
use taskwall_deck::DeckClient;

#[derive(Debug, Parser)]
#[command(name = "taskwall-host", version, about = "Rotate Deck boards on a foyer display")]
struct Cli {
    /// Config file (default: the platform config dir's taskwall/config.toml).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fetch once, print a single frame and exit.
    #[arg(long)]
    once: bool,

    /// Milliseconds between emitted frames.
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..))]
    frame_interval_ms: u64,

    /// Save this comma-separated board selection before starting.
    #[arg(long, value_delimiter = ',', conflicts_with = "clear_selection")]
    select: Option<Vec<i64>>,

    /// Forget the saved board selection before starting.
    #[arg(long)]
    clear_selection: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => WallConfig::from_file(path)
            .with_context(|| format!("cannot load config from {}", path.display()))?,
        None => WallConfig::load_or_default(&WallConfig::default_config_path())
            .context("cannot load default config")?,
    };
    let _log_guard = init_tracing(&config.logging);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "taskwall-host starting");
    config.validate().context("invalid configuration")?;

    let store = SelectionStore::default_location();
    if cli.clear_selection {
        store.save(&BTreeSet::new())?;
        tracing::info!("board selection cleared");
    } else if let Some(ids) = &cli.select {
        store.save(&ids.iter().copied().collect())?;
        tracing::info!(?ids, "board selection saved");
    }

    let client = DeckClient::new(config.deck.to_deck_config())?;
    let wall = Arc::new(TaskWall::new(client, config)?.with_selection_store(store)?);

    if let Err(e) = wall.refresh(RefreshMode::Manual).await {
        tracing::error!(error = %e, "initial refresh failed");
    }

    if cli.once {
        emit(&wall.frame())?;
        wall.shutdown();
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let refresh = wall.spawn_refresh_loop(cancel.child_token());

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for ctrl-c");
            return;
        }
        tracing::info!("interrupt received, shutting down");
        ctrl_c.cancel();
    });

    let result = frame_loop(&wall, Duration::from_millis(cli.frame_interval_ms), &cancel).await;

    cancel.cancel();
    wall.shutdown();
    if let Err(e) = refresh.await {
        tracing::warn!(error = %e, "refresh loop ended abnormally");
    }

    match &result {
        Ok(()) => tracing::info!("taskwall-host shut down cleanly"),
        Err(e) => tracing::error!(error = %e, "taskwall-host exited with error"),
    }
    result
}

async fn frame_loop<S: taskwall_deck::BoardSource>(
    wall: &TaskWall<S>,
    every: Duration,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return Ok(()),
            _ = ticker.tick() => emit(&wall.frame())?,
        }
    }
}

/// Write one frame as a JSON line.
fn emit(frame: &WallFrame) -> anyhow::Result<()> {
    let line = serde_json::to_string(frame).context("cannot serialize frame")?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{line}").context("cannot write frame to stdout")?;
    stdout.flush().context("cannot flush stdout")?;
    Ok(())
}

/// Stderr logging, plus a daily rolling file when `logging.directory` is
/// set. The returned guard must live until exit or buffered lines are lost.
fn init_tracing(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.effective_filter()));
    let stderr = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    match &logging.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "taskwall.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(filter).with(stderr).init();
            None
        }
    }
}
