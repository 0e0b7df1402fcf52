//! Periodic full reload
//!
//! Runs the first reload after a startup delay and then on a fixed
//! interval until the shutdown signal flips. Each cycle runs in its own task,
//! so a panicking reload is logged and the loop keeps going.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use super::TopologyCache;
use crate::config::ReloadSettings;
use crate::provider::CloudProvider;

/// Background driver for [`TopologyCache::reload`]
pub struct ReloadScheduler<P: CloudProvider> {
    cache: Arc<TopologyCache<P>>,
    interval: Duration,
    startup_delay: Duration,
}

/// Shortest interval accepted; `tokio::time::interval` rejects zero.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

impl<P: CloudProvider + 'static> ReloadScheduler<P> {
    /// A zero `interval` is raised to one millisecond.
    pub fn new(cache: Arc<TopologyCache<P>>, interval: Duration, startup_delay: Duration) -> Self {
        Self {
            cache,
            interval: interval.max(MIN_INTERVAL),
            startup_delay,
        }
    }

    pub fn from_settings(cache: Arc<TopologyCache<P>>, settings: &ReloadSettings) -> Self {
        Self::new(cache, settings.interval(), settings.startup_delay())
    }

    /// Run until `shutdown` becomes true or its sender is dropped.
    ///
    /// Returns the number of cycles started.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> usize {
        if *shutdown.borrow() {
            return 0;
        }

        info!(
            "Reload scheduler starting: first reload in {:?}, then every {:?}",
            self.startup_delay, self.interval
        );

        tokio::select! {
            _ = tokio::time::sleep(self.startup_delay) => {}
            _ = shutdown.changed() => {
                info!("Reload scheduler stopped before first reload");
                return 0;
            }
        }

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut cycles = 0;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    cycles += 1;
                    self.run_cycle(cycles).await;
                }
                _ = shutdown.changed() => break,
            }
        }

        info!("Reload scheduler stopped after {} cycles", cycles);
        cycles
    }

    async fn run_cycle(&self, cycle: usize) {
        let cache = Arc::clone(&self.cache);
        match tokio::spawn(async move { cache.reload().await }).await {
            Ok(Ok(report)) => debug!(
                "Reload cycle {} published generation {}",
                cycle, report.generation
            ),
            Ok(Err(err)) => error!("Reload cycle {} failed: {}", cycle, err),
            Err(err) if err.is_panic() => error!("Reload cycle {} panicked: {}", cycle, err),
            Err(err) => warn!("Reload cycle {} was cancelled: {}", cycle, err),
        }
    }
}
