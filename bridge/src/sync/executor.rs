//! Sync operation executor

use std::time::Duration;

use tracing::{error, info};

use crate::argocd::ArgoCdApi;
use crate::errors::BridgeError;
use crate::models::sync::SyncProgress;
use crate::sync::tracker::{SyncJob, SyncOperationTracker};

/// A step of the sync walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncPhase {
    pub name: &'static str,
    pub message: &'static str,
    pub percentage: u8,
}

impl SyncPhase {
    fn progress(&self) -> SyncProgress {
        SyncProgress {
            phase: self.name.to_string(),
            message: self.message.to_string(),
            percentage: self.percentage,
        }
    }
}

/// Phases every sync walks through, in order
pub const SYNC_PHASES: [SyncPhase; 4] = [
    SyncPhase {
        name: "Validating",
        message: "Validating application manifests",
        percentage: 20,
    },
    SyncPhase {
        name: "Syncing",
        message: "Applying resources to the cluster",
        percentage: 50,
    },
    SyncPhase {
        name: "Waiting",
        message: "Waiting for resources to become healthy",
        percentage: 80,
    },
    SyncPhase {
        name: "Completed",
        message: "Sync completed",
        percentage: 100,
    },
];

/// Phase that calls Argo CD
const TRIGGER_PHASE: &str = "Syncing";

/// Executor settings
#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    /// Delay between consecutive phases
    pub phase_delay: Duration,

    /// Hard limit for a whole operation
    pub deadline: Duration,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            phase_delay: Duration::from_secs(2),
            deadline: Duration::from_secs(300),
        }
    }
}

impl ExecutorSettings {
    /// Expected wall time of a successful sync
    pub fn estimated_duration(&self) -> Duration {
        self.phase_delay * (SYNC_PHASES.len() as u32 - 1)
    }
}

/// Run one job to a terminal state. Errors are recorded on the operation,
/// never returned.
pub async fn execute(
    tracker: &SyncOperationTracker,
    api: &dyn ArgoCdApi,
    job: &SyncJob,
    settings: &ExecutorSettings,
) {
    if let Err(e) = tracker.begin(&job.sync_id).await {
        error!("Unable to start sync {}: {}", job.sync_id, e);
        return;
    }
    info!("Executing sync {} for {}", job.sync_id, job.application_name);

    let result = match tokio::time::timeout(
        settings.deadline,
        walk_phases(tracker, api, job, settings.phase_delay),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(BridgeError::UpstreamError(format!(
            "Sync operation timed out after {}s",
            settings.deadline.as_secs()
        ))),
    };

    let recorded = match result {
        Ok(resources_changed) => tracker.complete(&job.sync_id, resources_changed).await,
        Err(e) => tracker.fail(&job.sync_id, &e.detail()).await,
    };
    if let Err(e) = recorded {
        error!("Unable to record result of sync {}: {}", job.sync_id, e);
    }
}

async fn walk_phases(
    tracker: &SyncOperationTracker,
    api: &dyn ArgoCdApi,
    job: &SyncJob,
    phase_delay: Duration,
) -> Result<u32, BridgeError> {
    let mut resources_changed = 0;

    for (i, phase) in SYNC_PHASES.iter().enumerate() {
        if i > 0 {
            tokio::time::sleep(phase_delay).await;
        }

        tracker.report_progress(&job.sync_id, phase.progress()).await?;

        if phase.name == TRIGGER_PHASE {
            let triggered = api.trigger_sync(&job.application_name, &job.options).await?;
            resources_changed = triggered.resources_changed;
        }
    }

    Ok(resources_changed)
}
