//! Classified deployment errors and recovery actions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category of a deployment failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    SyncFailed,
    HealthCheckFailed,
    ResourceError,
    PermissionError,
    NetworkError,
}

/// Severity of a deployment failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// A raw failure message after classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentError {
    #[serde(rename = "type")]
    pub error_type: ErrorType,

    pub severity: Severity,

    pub recoverable: bool,

    /// Never empty
    pub suggested_actions: Vec<String>,

    /// Raw upstream message
    pub message: String,

    pub timestamp: DateTime<Utc>,

    pub application_name: String,

    pub environment: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
}

/// Risk of running a recovery action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// A suggested remediation for a classified error
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryAction {
    pub id: String,
    pub title: String,
    pub description: String,
    pub automated: bool,
    pub risk_level: RiskLevel,
    pub estimated_time: String,
    pub prerequisites: Vec<String>,
}
