//! Cache Maintenance Task
//!
//! Background task that periodically runs the cache's maintenance pass:
//! sweeping expired entries from all tiers and decaying predictive scores.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::TieredCache;

// == Maintenance Task ==
/// Handle to a running maintenance loop.
///
/// Dropping the handle leaves the loop running; call [`shutdown`] for a
/// clean stop or [`abort`] to cancel outright.
///
/// [`shutdown`]: MaintenanceTask::shutdown
/// [`abort`]: MaintenanceTask::abort
pub struct MaintenanceTask {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl MaintenanceTask {
    /// Signals the loop to stop firing and waits for an in-flight sweep to
    /// finish before returning.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            if !e.is_cancelled() {
                warn!("Maintenance task ended abnormally: {}", e);
            }
        }
        info!("Maintenance task stopped");
    }

    /// Cancels the loop immediately, abandoning any in-flight sweep.
    pub fn abort(&self) {
        self.handle.abort();
    }

    /// Whether the loop has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// Spawns a background task that runs a maintenance pass on the cache at
/// the given interval.
///
/// # Arguments
/// * `cache` - Shared reference to the cache
/// * `interval_ms` - Interval in milliseconds between passes
///
/// # Example
/// ```ignore
/// let cache = Arc::new(TieredCache::new(CacheConfig::from_env()).await);
/// let task = spawn_maintenance_task(cache.clone(), 60_000);
/// // Later, during shutdown:
/// task.shutdown().await;
/// ```
pub fn spawn_maintenance_task(cache: Arc<TieredCache>, interval_ms: u64) -> MaintenanceTask {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(async move {
        info!(
            "Starting cache maintenance task with interval of {} ms",
            interval_ms
        );
        let mut ticker = tokio::time::interval(Duration::from_millis(interval_ms));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; consume it so the first
        // sweep happens one full interval after startup
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = cache.run_maintenance().await;
                    if report.total_removed() > 0 {
                        info!(
                            "Maintenance pass removed {} expired entries",
                            report.total_removed()
                        );
                    } else {
                        debug!("Maintenance pass found no expired entries");
                    }
                }
                _ = shutdown_rx.changed() => break,
            }
        }
    });

    MaintenanceTask {
        shutdown: shutdown_tx,
        handle,
    }
}
