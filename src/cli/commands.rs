use std::path::Path;

use crate::app::{AppContext, Result};
use crate::config::Config;
use crate::fetcher::http_fetcher::build_client;
use crate::notifier::NotifierRegistry;
use crate::scheduler::format_interval;

/// Load the configuration, applying a command-line job count before
/// validation so the override obeys the same limits.
pub fn load_config(path: &Path, jobs: Option<usize>) -> Result<Config> {
    let mut config = Config::load(path)?;

    if let Some(jobs) = jobs {
        config.fetch.jobs = jobs;
        config.validate()?;
    }

    Ok(config)
}

/// Poll feeds until SIGINT or SIGTERM, then wait for in-flight work.
pub async fn run(ctx: &AppContext) -> Result<()> {
    let handle = ctx.scheduler().start();

    tracing::info!(
        "tidings started ({} feeds, PID: {})",
        ctx.feeds.len(),
        std::process::id()
    );

    wait_for_shutdown_signal().await?;

    tracing::info!("Shutting down, waiting for in-flight feeds...");
    handle.shutdown().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

/// Run a single pass over every due feed.
pub async fn once(ctx: &AppContext) -> Result<()> {
    if ctx.feeds.is_empty() {
        println!("No feeds configured");
        return Ok(());
    }

    let summary = ctx.scheduler().run_tick().await;

    println!(
        "Update complete: {} feeds polled ({} not modified, {} first fetches), {} notifications, {} errors",
        summary.started,
        summary.not_modified,
        summary.baselined,
        summary.notified,
        summary.errors
    );
    Ok(())
}

/// Print what a run would watch, after the same checks a run performs.
pub fn check(config: &Config) -> Result<()> {
    let feeds = config.resolved_feeds();
    let registry = NotifierRegistry::from_config(config, build_client()?)?;
    registry.ensure_resolves(&feeds)?;

    println!("Configuration OK");
    println!("  database: {}", config.database_path()?.display());
    println!("  jobs: {}", config.jobs());

    println!("Notifiers:");
    println!("  stdout (built in)");
    for notifier in &config.notifiers {
        println!("  {} ({})", notifier.id, notifier.kind);
    }

    if feeds.is_empty() {
        println!("No feeds");
        return Ok(());
    }

    println!("Feeds:");
    for feed in &feeds {
        println!(
            "  {} [{}] every {} -> {}\n    {}",
            feed.display_name,
            feed.id,
            format_interval(u64::from(feed.interval) * 60),
            feed.notifier,
            feed.url
        );
    }

    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => tracing::debug!("Received SIGTERM"),
        _ = sigint.recv() => tracing::debug!("Received SIGINT"),
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
