//! Argo CD application models

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Argo CD application resource
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Application {
    pub metadata: ObjectMeta,

    #[serde(default)]
    pub spec: ApplicationSpec,

    #[serde(default)]
    pub status: ApplicationStatus,
}

/// Kubernetes object metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,

    #[serde(default)]
    pub namespace: Option<String>,

    #[serde(default)]
    pub labels: HashMap<String, String>,
}

/// Application spec
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationSpec {
    #[serde(default)]
    pub project: Option<String>,

    #[serde(default)]
    pub destination: ApplicationDestination,
}

/// Deployment destination
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationDestination {
    #[serde(default)]
    pub server: Option<String>,

    #[serde(default)]
    pub namespace: Option<String>,
}

/// Application status as reported by the controller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStatus {
    #[serde(default)]
    pub health: HealthInfo,

    #[serde(default)]
    pub sync: SyncInfo,

    #[serde(default)]
    pub operation_state: Option<OperationState>,

    #[serde(default)]
    pub conditions: Vec<ApplicationCondition>,

    #[serde(default)]
    pub resources: Vec<ResourceStatus>,

    #[serde(default)]
    pub reconciled_at: Option<DateTime<Utc>>,
}

/// Health block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthInfo {
    /// Healthy, Progressing, Degraded, Suspended, Missing or Unknown
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub message: Option<String>,
}

/// Sync block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncInfo {
    /// Synced, OutOfSync or Unknown
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub revision: Option<String>,
}

/// Last (or current) operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationState {
    /// Running, Succeeded, Failed, Error or Terminating
    #[serde(default)]
    pub phase: Option<String>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub sync_result: Option<SyncOperationResult>,
}

/// Result of a sync operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncOperationResult {
    #[serde(default)]
    pub revision: Option<String>,

    #[serde(default)]
    pub resources: Vec<ResourceResult>,
}

/// Per-resource sync outcome
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceResult {
    #[serde(default)]
    pub kind: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub namespace: Option<String>,

    /// Synced, SyncFailed, Pruned or PruneSkipped
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub message: Option<String>,
}

/// Application condition (errors and warnings)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationCondition {
    #[serde(rename = "type", default)]
    pub condition_type: String,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub last_transition_time: Option<DateTime<Utc>>,
}

impl ApplicationCondition {
    /// Conditions whose type ends in `Error` (SyncError, ComparisonError, ...)
    pub fn is_error(&self) -> bool {
        self.condition_type.ends_with("Error")
    }
}

/// Managed resource summary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceStatus {
    #[serde(default)]
    pub kind: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub namespace: Option<String>,

    #[serde(default)]
    pub health: Option<HealthInfo>,
}

/// Sync request body for `POST /api/v1/applications/{name}/sync`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub prune: bool,

    pub dry_run: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<SyncStrategy>,
}

/// Sync strategy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncStrategy {
    pub apply: SyncStrategyApply,
}

/// Apply strategy options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncStrategyApply {
    pub force: bool,
}

/// Response of `GET /api/version`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionMessage {
    #[serde(rename = "Version")]
    pub version: String,
}
