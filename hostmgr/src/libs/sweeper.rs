//! Periodically reclaims expired holds and leases from the host cache

use chrono::prelude::*;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, event, instrument};

use super::HostCache;

/// The hosts reclaimed by a single sweep
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SweepReport {
    /// The hosts whose expired holds were cleared
    pub held: Vec<String>,
    /// The hosts whose expired leases were reclaimed
    pub placing: Vec<String>,
}

impl SweepReport {
    /// Check if this sweep reclaimed nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.held.is_empty() && self.placing.is_empty()
    }
}

/// Drives the host caches expiry sweeps on an interval
pub struct Sweeper {
    /// The host cache to sweep
    cache: Arc<HostCache>,
    /// How long to wait between sweeps
    interval: Duration,
}

impl Sweeper {
    /// Create a new sweeper
    ///
    /// # Arguments
    ///
    /// * `cache` - The host cache to sweep
    /// * `interval` - How long to wait between sweeps
    #[must_use]
    pub fn new(cache: Arc<HostCache>, interval: Duration) -> Self {
        Sweeper { cache, interval }
    }

    /// Perform a single sweep
    ///
    /// In most cases you want to just call `start`.
    ///
    /// # Arguments
    ///
    /// * `now` - The time to check holds and leases against
    #[instrument(name = "Sweeper::single_sweep", skip(self))]
    pub fn single_sweep(&self, now: DateTime<Utc>) -> SweepReport {
        // clear any holds that have all expired
        let held = self.cache.reset_expired_held_host_summaries(now);
        // reclaim any hosts whose leases were abandoned
        let placing = self.cache.reset_expired_placing_host_summaries(now);
        let report = SweepReport { held, placing };
        if !report.is_empty() {
            event!(
                Level::INFO,
                held = report.held.len(),
                placing = report.placing.len(),
                msg = "Reclaimed expired hosts"
            );
        }
        report
    }

    /// Sweep on our interval until shutdown resolves
    ///
    /// # Arguments
    ///
    /// * `shutdown` - Resolves when we should stop sweeping
    pub async fn start<F: Future<Output = ()>>(self, shutdown: F) {
        let mut ticker = tokio::time::interval(self.interval);
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // perform a single sweep
                    self.single_sweep(Utc::now());
                }
                () = &mut shutdown => {
                    event!(Level::INFO, msg = "Stopping sweeper");
                    break;
                }
            }
        }
    }
}
