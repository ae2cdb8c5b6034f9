//! Deployment status models

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::diagnosis::DeploymentError;

/// Application health as reported by Argo CD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Progressing,
    Degraded,
    Suspended,
    Missing,
    Unknown,
}

impl HealthStatus {
    /// Parse the upstream string, falling back to `Unknown`
    pub fn from_upstream(value: Option<&str>) -> Self {
        match value {
            Some("Healthy") => HealthStatus::Healthy,
            Some("Progressing") => HealthStatus::Progressing,
            Some("Degraded") => HealthStatus::Degraded,
            Some("Suspended") => HealthStatus::Suspended,
            Some("Missing") => HealthStatus::Missing,
            _ => HealthStatus::Unknown,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Application sync state as reported by Argo CD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncStatus {
    Synced,
    OutOfSync,
    Unknown,
}

impl SyncStatus {
    /// Parse the upstream string, falling back to `Unknown`
    pub fn from_upstream(value: Option<&str>) -> Self {
        match value {
            Some("Synced") => SyncStatus::Synced,
            Some("OutOfSync") => SyncStatus::OutOfSync,
            _ => SyncStatus::Unknown,
        }
    }
}

/// Last observed state of one application in one environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStatus {
    pub application_name: String,

    pub health: HealthStatus,

    pub sync: SyncStatus,

    pub last_sync_time: Option<DateTime<Utc>>,

    pub environment: String,

    pub namespace: String,

    /// Classified errors, empty when healthy
    pub errors: Vec<DeploymentError>,

    /// Whether the caller may trigger a sync. Filled in per request.
    pub can_sync: bool,
}

impl DeploymentStatus {
    /// Best-effort status used when the upstream could not be queried
    pub fn unknown(
        application_name: &str,
        environment: &str,
        error: DeploymentError,
    ) -> Self {
        Self {
            application_name: application_name.to_string(),
            health: HealthStatus::Unknown,
            sync: SyncStatus::Unknown,
            last_sync_time: None,
            environment: environment.to_string(),
            namespace: String::new(),
            errors: vec![error],
            can_sync: false,
        }
    }

    /// Copy of this status with the caller's sync permission applied
    pub fn for_caller(mut self, can_sync: bool) -> Self {
        self.can_sync = can_sync;
        self
    }
}

/// One status per environment for a service
#[derive(Debug, Clone, PartialEq)]
pub struct MultiEnvironmentStatus {
    pub service_name: String,
    pub environments: BTreeMap<String, DeploymentStatus>,
}

impl MultiEnvironmentStatus {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            environments: BTreeMap::new(),
        }
    }

    /// Aggregate health, always derived from the current environment map.
    ///
    /// Degraded wins over Unknown, which wins over everything else.
    pub fn overall_health(&self) -> HealthStatus {
        let statuses = self.environments.values().map(|s| s.health);
        let mut overall = HealthStatus::Healthy;
        for health in statuses {
            match health {
                HealthStatus::Degraded => return HealthStatus::Degraded,
                HealthStatus::Unknown => overall = HealthStatus::Unknown,
                _ => {}
            }
        }
        overall
    }

    pub fn is_empty(&self) -> bool {
        self.environments.is_empty()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MultiEnvironmentStatusWire<'a> {
    service_name: &'a str,
    environments: &'a BTreeMap<String, DeploymentStatus>,
    overall_health: HealthStatus,
}

impl Serialize for MultiEnvironmentStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        MultiEnvironmentStatusWire {
            service_name: &self.service_name,
            environments: &self.environments,
            overall_health: self.overall_health(),
        }
        .serialize(serializer)
    }
}
