//! Janitor worker for sync history retention

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::{debug, info};

use crate::sync::tracker::SyncOperationTracker;

/// Janitor worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Cleanup interval
    pub interval: Duration,

    /// Operations older than this are dropped
    pub retention: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),    // 1 hour
            retention: Duration::from_secs(86400),  // 24 hours
        }
    }
}

/// Run the janitor worker
pub async fn run<S, F>(
    options: &Options,
    tracker: &SyncOperationTracker,
    sleep_fn: S,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Janitor worker starting...");

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Janitor worker shutting down...");
                return;
            }
            _ = sleep_fn(options.interval) => {}
        }

        let removed = tracker.cleanup(options.retention).await;
        debug!("Janitor pass removed {} sync operations", removed);
    }
}
