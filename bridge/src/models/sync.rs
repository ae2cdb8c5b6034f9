//! Manual sync operation models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::diagnosis::DeploymentError;

/// Lifecycle state of a manual sync
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOperationStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl SyncOperationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncOperationStatus::Completed | SyncOperationStatus::Failed)
    }
}

/// Options passed to Argo CD when syncing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOptions {
    #[serde(default)]
    pub prune: bool,

    #[serde(default)]
    pub dry_run: bool,

    #[serde(default)]
    pub force: bool,
}

/// Progress of an in-flight sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncProgress {
    pub phase: String,
    pub message: String,
    /// 0 to 100
    pub percentage: u8,
}

/// Terminal outcome of a sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub resources_changed: u32,

    /// Milliseconds from trigger to terminal state
    pub duration: u64,
}

/// One tracked manual sync request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualSyncOperation {
    pub sync_id: String,

    pub application_name: String,

    pub environment: String,

    pub triggered_by: String,

    pub triggered_at: DateTime<Utc>,

    pub status: SyncOperationStatus,

    pub options: SyncOptions,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<SyncProgress>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SyncOutcome>,

    /// Classification of the failure, set only for failed operations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classified_error: Option<DeploymentError>,
}

/// Returned to the caller when a sync is accepted
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub success: bool,
    pub sync_id: String,
    pub operation: ManualSyncOperation,
    /// Milliseconds
    pub estimated_duration: u64,
}
