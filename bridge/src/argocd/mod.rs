//! Argo CD upstream abstraction
//!
//! The bridge talks to Argo CD through [`ArgoCdApi`]. The live REST client
//! lives in `http::argocd`; [`simulated::SimulatedArgoCd`] answers without a
//! network and is the default for local development.

pub mod simulated;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::BridgeError;
use crate::models::status::{HealthStatus, SyncStatus};
use crate::models::sync::SyncOptions;

/// Raw application state before error classification
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationSnapshot {
    pub name: String,
    pub health: HealthStatus,
    pub sync: SyncStatus,
    pub last_sync_time: Option<DateTime<Utc>>,
    pub namespace: String,
    /// Unclassified error messages reported for the application
    pub error_messages: Vec<String>,
}

impl ApplicationSnapshot {
    /// Healthy and synced snapshot with no errors
    pub fn healthy(name: &str, namespace: &str) -> Self {
        Self {
            name: name.to_string(),
            health: HealthStatus::Healthy,
            sync: SyncStatus::Synced,
            last_sync_time: None,
            namespace: namespace.to_string(),
            error_messages: vec![],
        }
    }
}

/// Outcome of asking Argo CD to sync
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggeredSync {
    pub resources_changed: u32,
}

/// Argo CD operations used by the bridge
#[async_trait]
pub trait ArgoCdApi: Send + Sync {
    /// Current state of an application
    async fn fetch_application(&self, name: &str) -> Result<ApplicationSnapshot, BridgeError>;

    /// Sync an application and wait for Argo CD to accept it
    async fn trigger_sync(
        &self,
        name: &str,
        options: &SyncOptions,
    ) -> Result<TriggeredSync, BridgeError>;

    /// Server version, used as a connectivity probe
    async fn version(&self) -> Result<String, BridgeError>;
}
