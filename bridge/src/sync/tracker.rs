//! Manual sync operation tracking
//!
//! The tracker owns every [`ManualSyncOperation`] the bridge has created.
//! `create_operation` stores the operation as pending and puts a
//! [`SyncJob`] on the queue; the sync runner worker picks jobs up and
//! reports progress back through `begin`, `report_progress`, `complete`
//! and `fail`. Every state change goes through [`SyncFsm`], so an
//! operation's status never moves backwards.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, error, info, warn};

use crate::diagnose::classifier::ErrorClassifier;
use crate::errors::BridgeError;
use crate::models::sync::{
    ManualSyncOperation, SyncOperationStatus, SyncOptions, SyncOutcome, SyncProgress,
};
use crate::sync::fsm::{SyncEvent, SyncFsm};
use crate::utils::generate_sync_id;

/// Work item for the sync runner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncJob {
    pub sync_id: String,
    pub application_name: String,
    pub options: SyncOptions,
}

/// Receiving end of the sync queue
pub type SyncJobReceiver = mpsc::UnboundedReceiver<SyncJob>;

/// Tracks manual sync operations in memory
pub struct SyncOperationTracker {
    operations: RwLock<HashMap<String, ManualSyncOperation>>,
    queue: mpsc::UnboundedSender<SyncJob>,
    classifier: ErrorClassifier,
}

impl SyncOperationTracker {
    /// Create a tracker and the queue its jobs are delivered on
    pub fn new(classifier: ErrorClassifier) -> (Self, SyncJobReceiver) {
        let (queue, jobs) = mpsc::unbounded_channel();
        let tracker = Self {
            operations: RwLock::new(HashMap::new()),
            queue,
            classifier,
        };
        (tracker, jobs)
    }

    /// Record a new pending sync and queue it. Does not wait for execution.
    pub async fn create_operation(
        &self,
        application_name: &str,
        environment: &str,
        triggered_by: &str,
        options: SyncOptions,
    ) -> ManualSyncOperation {
        let operation = ManualSyncOperation {
            sync_id: generate_sync_id(),
            application_name: application_name.to_string(),
            environment: environment.to_string(),
            triggered_by: triggered_by.to_string(),
            triggered_at: Utc::now(),
            status: SyncOperationStatus::Pending,
            options,
            progress: None,
            result: None,
            classified_error: None,
        };

        {
            let mut operations = self.operations.write().await;
            operations.insert(operation.sync_id.clone(), operation.clone());
        }

        info!(
            "Created sync operation {} for {} ({}) by {}",
            operation.sync_id, application_name, environment, triggered_by
        );

        let job = SyncJob {
            sync_id: operation.sync_id.clone(),
            application_name: application_name.to_string(),
            options,
        };
        if self.queue.send(job).is_err() {
            error!("Sync queue closed, failing operation {}", operation.sync_id);
            if let Err(e) = self
                .fail(&operation.sync_id, "Sync worker is not running")
                .await
            {
                error!("Failed to record queue failure: {}", e);
            }
        }

        operation
    }

    /// Get an operation by ID
    pub async fn get_status(&self, sync_id: &str) -> Option<ManualSyncOperation> {
        self.operations.read().await.get(sync_id).cloned()
    }

    /// Most recent operations for an application, newest first
    pub async fn get_history(&self, application_name: &str, limit: usize) -> Vec<ManualSyncOperation> {
        let operations = self.operations.read().await;
        let mut history: Vec<ManualSyncOperation> = operations
            .values()
            .filter(|op| op.application_name == application_name)
            .cloned()
            .collect();
        history.sort_by(|a, b| b.triggered_at.cmp(&a.triggered_at));
        history.truncate(limit);
        history
    }

    /// Drop operations triggered more than `max_age` ago, whatever their
    /// state. Returns the number removed.
    pub async fn cleanup(&self, max_age: Duration) -> usize {
        let max_age = chrono::Duration::from_std(max_age).unwrap_or(chrono::Duration::MAX);
        let cutoff = Utc::now()
            .checked_sub_signed(max_age)
            .unwrap_or(chrono::DateTime::<Utc>::MIN_UTC);

        let mut operations = self.operations.write().await;
        let before = operations.len();
        operations.retain(|_, op| op.triggered_at >= cutoff);
        let removed = before - operations.len();

        if removed > 0 {
            info!("Removed {} sync operations older than {}", removed, cutoff);
        }
        removed
    }

    /// Number of tracked operations
    pub async fn len(&self) -> usize {
        self.operations.read().await.len()
    }

    /// Check if no operations are tracked
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Mark an operation as picked up by the worker
    pub async fn begin(&self, sync_id: &str) -> Result<(), BridgeError> {
        self.apply(sync_id, SyncEvent::Start).await
    }

    /// Record a phase update
    pub async fn report_progress(
        &self,
        sync_id: &str,
        progress: SyncProgress,
    ) -> Result<(), BridgeError> {
        self.apply(sync_id, SyncEvent::Progress(progress)).await
    }

    /// Record a successful sync
    pub async fn complete(&self, sync_id: &str, resources_changed: u32) -> Result<(), BridgeError> {
        self.apply_terminal(sync_id, SyncEvent::Complete, resources_changed)
            .await
    }

    /// Record a failed sync
    pub async fn fail(&self, sync_id: &str, error: &str) -> Result<(), BridgeError> {
        self.apply_terminal(sync_id, SyncEvent::Fail(error.to_string()), 0)
            .await
    }

    async fn apply(&self, sync_id: &str, event: SyncEvent) -> Result<(), BridgeError> {
        let mut operations = self.operations.write().await;
        let operation = operations
            .get_mut(sync_id)
            .ok_or_else(|| BridgeError::NotFound(format!("sync operation {}", sync_id)))?;

        let mut fsm = SyncFsm::resume(operation.status, operation.progress.as_ref());
        operation.status = fsm
            .process(&event)
            .map_err(BridgeError::InvalidTransition)?;

        if let SyncEvent::Progress(progress) = event {
            debug!(
                "Sync {} {}: {}%",
                sync_id, progress.phase, progress.percentage
            );
            operation.progress = Some(progress);
        }
        Ok(())
    }

    async fn apply_terminal(
        &self,
        sync_id: &str,
        event: SyncEvent,
        resources_changed: u32,
    ) -> Result<(), BridgeError> {
        let mut operations = self.operations.write().await;
        let operation = operations
            .get_mut(sync_id)
            .ok_or_else(|| BridgeError::NotFound(format!("sync operation {}", sync_id)))?;

        if operation.result.is_some() {
            return Err(BridgeError::InvalidTransition(format!(
                "sync operation {} already has a result",
                sync_id
            )));
        }

        let mut fsm = SyncFsm::resume(operation.status, operation.progress.as_ref());
        operation.status = fsm
            .process(&event)
            .map_err(BridgeError::InvalidTransition)?;

        let duration = (Utc::now() - operation.triggered_at)
            .num_milliseconds()
            .max(0) as u64;

        match event {
            SyncEvent::Fail(error) => {
                warn!("Sync {} failed after {}ms: {}", sync_id, duration, error);
                operation.classified_error = Some(self.classifier.classify(
                    &error,
                    &operation.application_name,
                    &operation.environment,
                ));
                operation.result = Some(SyncOutcome {
                    success: false,
                    error: Some(error),
                    resources_changed: 0,
                    duration,
                });
            }
            _ => {
                info!(
                    "Sync {} completed in {}ms ({} resources changed)",
                    sync_id, duration, resources_changed
                );
                operation.result = Some(SyncOutcome {
                    success: true,
                    error: None,
                    resources_changed,
                    duration,
                });
            }
        }
        Ok(())
    }
}
