//! Watch command: keep the cache warm until interrupted

use std::time::Duration;

use colored::Colorize;
use log::info;
use tokio::sync::watch;

use crate::cache::ReloadScheduler;
use crate::cli::args::GlobalOptions;
use crate::cli::context::CommandContext;
use crate::error::Result;

/// Run the reload scheduler until Ctrl-C.
///
/// `interval` overrides the configured reload interval, in seconds.
pub async fn run(opts: &GlobalOptions, interval: Option<u64>) -> Result<()> {
    let ctx = CommandContext::new(opts)?;

    let mut settings = ctx.config.reload.clone();
    if let Some(secs) = interval {
        settings.interval_secs = secs.max(1);
    }

    let scheduler = ReloadScheduler::from_settings(ctx.cache.clone(), &settings);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(scheduler.run(shutdown_rx));

    println!(
        "{} reloading every {:?} (Ctrl-C to stop)",
        "Watching".bold(),
        Duration::from_secs(settings.interval_secs)
    );

    tokio::signal::ctrl_c().await?;
    info!("Interrupt received, stopping scheduler");
    // The receiver may already be gone if the scheduler exited.
    let _ = shutdown_tx.send(true);

    let cycles = handle
        .await
        .map_err(|e| crate::error::Error::Other(format!("scheduler task failed: {}", e)))?;
    let snapshot = ctx.cache.snapshot();
    println!(
        "Stopped after {} reload cycles; last generation {}",
        cycles, snapshot.generation
    );
    Ok(())
}
