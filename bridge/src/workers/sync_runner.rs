//! Sync runner worker
//!
//! Consumes the tracker's job queue and executes each job on its own task,
//! so syncs of different applications run concurrently.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;

use futures::FutureExt;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::argocd::ArgoCdApi;
use crate::sync::executor::{self, ExecutorSettings};
use crate::sync::tracker::{SyncJobReceiver, SyncOperationTracker};

/// Recorded on an operation whose execution panicked
pub const SYNC_PANICKED: &str = "Sync aborted by an internal error";

/// Sync runner options
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub executor: ExecutorSettings,
}

/// Run the sync runner worker
pub async fn run(
    options: &Options,
    tracker: Arc<SyncOperationTracker>,
    api: Arc<dyn ArgoCdApi>,
    mut jobs: SyncJobReceiver,
    mut shutdown_signal: Pin<Box<dyn Future<Output = ()> + Send>>,
) {
    info!("Sync runner worker starting...");

    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Sync runner worker shutting down...");
                break;
            }
            job = jobs.recv() => {
                let Some(job) = job else {
                    info!("Sync queue closed, sync runner stopping...");
                    break;
                };

                let tracker = tracker.clone();
                let api = api.clone();
                let settings = options.executor.clone();
                in_flight.spawn(async move {
                    let execution = executor::execute(tracker.as_ref(), api.as_ref(), &job, &settings);
                    if AssertUnwindSafe(execution).catch_unwind().await.is_err() {
                        error!("Sync {} panicked", job.sync_id);
                        if let Err(e) = tracker.fail(&job.sync_id, SYNC_PANICKED).await {
                            error!("Unable to fail sync {}: {}", job.sync_id, e);
                        }
                    }
                });
            }
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = joined {
                    error!("Sync task panicked: {}", e);
                }
            }
        }
    }

    // Jobs still queued never started; record them as failed
    jobs.close();
    while let Ok(job) = jobs.try_recv() {
        warn!("Dropping queued sync {} on shutdown", job.sync_id);
        if let Err(e) = tracker
            .fail(&job.sync_id, "Bridge shut down before the sync started")
            .await
        {
            error!("Unable to fail sync {}: {}", job.sync_id, e);
        }
    }

    // Syncs are not cancellable; let running ones finish
    if !in_flight.is_empty() {
        info!("Waiting for {} in-flight syncs...", in_flight.len());
    }
    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            error!("Sync task panicked: {}", e);
        }
    }
}
