//! Argo CD REST API client

use async_trait::async_trait;
use tracing::info;
use upstream_models::models::argocd::{
    Application, SyncRequest, SyncStrategy, SyncStrategyApply, VersionMessage,
};

use crate::argocd::{ApplicationSnapshot, ArgoCdApi, TriggeredSync};
use crate::errors::BridgeError;
use crate::http::client::{encode_segment, HttpClient};
use crate::models::status::{HealthStatus, SyncStatus};
use crate::models::sync::SyncOptions;

impl HttpClient {
    /// Get an application
    pub async fn get_application(&self, name: &str) -> Result<Application, BridgeError> {
        let path = format!("/api/v1/applications/{}", encode_segment(name));
        self.get(&path).await
    }

    /// Request a sync of an application
    pub async fn sync_application(
        &self,
        name: &str,
        request: &SyncRequest,
    ) -> Result<Application, BridgeError> {
        let path = format!("/api/v1/applications/{}/sync", encode_segment(name));
        self.post(&path, request).await
    }

    /// Get the server version
    pub async fn get_version(&self) -> Result<VersionMessage, BridgeError> {
        self.get("/api/version").await
    }
}

/// [`ArgoCdApi`] backed by a live Argo CD server
pub struct ArgoCdHttpApi {
    client: HttpClient,
}

impl ArgoCdHttpApi {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ArgoCdApi for ArgoCdHttpApi {
    async fn fetch_application(&self, name: &str) -> Result<ApplicationSnapshot, BridgeError> {
        let app = self.client.get_application(name).await?;
        Ok(snapshot_from_application(app))
    }

    async fn trigger_sync(
        &self,
        name: &str,
        options: &SyncOptions,
    ) -> Result<TriggeredSync, BridgeError> {
        let request = SyncRequest {
            prune: options.prune,
            dry_run: options.dry_run,
            strategy: options.force.then_some(SyncStrategy {
                apply: SyncStrategyApply { force: true },
            }),
        };

        let app = self.client.sync_application(name, &request).await?;
        let resources_changed = app
            .status
            .operation_state
            .and_then(|op| op.sync_result)
            .map(|result| result.resources.len() as u32)
            .unwrap_or(0);

        info!(
            "Argo CD accepted sync for {} ({} resources)",
            name, resources_changed
        );
        Ok(TriggeredSync { resources_changed })
    }

    async fn version(&self) -> Result<String, BridgeError> {
        Ok(self.client.get_version().await?.version)
    }
}

/// Flatten an application resource into a snapshot.
///
/// Error messages are gathered from error conditions, a failed last
/// operation, resources that failed to sync and degraded resources.
pub fn snapshot_from_application(app: Application) -> ApplicationSnapshot {
    let status = app.status;
    let mut error_messages = Vec::new();

    for condition in status.conditions.iter().filter(|c| c.is_error()) {
        error_messages.push(condition.message.clone());
    }

    if let Some(op) = &status.operation_state {
        let failed = matches!(op.phase.as_deref(), Some("Failed") | Some("Error"));
        if failed {
            if let Some(message) = &op.message {
                error_messages.push(message.clone());
            }
        }
        if let Some(result) = &op.sync_result {
            for resource in &result.resources {
                if resource.status.as_deref() == Some("SyncFailed") {
                    error_messages.push(format!(
                        "{}/{}: {}",
                        resource.kind,
                        resource.name,
                        resource.message.as_deref().unwrap_or("sync failed")
                    ));
                }
            }
        }
    }

    for resource in &status.resources {
        let Some(health) = &resource.health else {
            continue;
        };
        if health.status.as_deref() == Some("Degraded") {
            error_messages.push(format!(
                "{}/{}: {}",
                resource.kind,
                resource.name,
                health.message.as_deref().unwrap_or("resource degraded")
            ));
        }
    }

    let last_sync_time = status
        .operation_state
        .as_ref()
        .and_then(|op| op.finished_at)
        .or(status.reconciled_at);

    ApplicationSnapshot {
        name: app.metadata.name,
        health: HealthStatus::from_upstream(status.health.status.as_deref()),
        sync: SyncStatus::from_upstream(status.sync.status.as_deref()),
        last_sync_time,
        namespace: app.spec.destination.namespace.unwrap_or_default(),
        error_messages,
    }
}
