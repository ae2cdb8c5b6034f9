//! Deployment status service
//!
//! Resolves catalog entities to Argo CD applications and answers status,
//! sync, error and health queries for them. Statuses go through the
//! [`StatusStore`]; manual syncs are handed to the [`SyncOperationTracker`].

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::argocd::{ApplicationSnapshot, ArgoCdApi};
use crate::cache::status::StatusStore;
use crate::catalog::Entity;
use crate::diagnose::classifier::ErrorClassifier;
use crate::diagnose::recovery::collect_recovery_actions;
use crate::errors::BridgeError;
use crate::models::diagnosis::{DeploymentError, RecoveryAction};
use crate::models::status::{DeploymentStatus, MultiEnvironmentStatus};
use crate::models::sync::{ManualSyncOperation, SyncOperationStatus, SyncOptions, SyncResult};
use crate::service::naming::{environment_application_name, infer_environment, ENVIRONMENTS};
use crate::service::policy::SyncPolicy;
use crate::sync::tracker::SyncOperationTracker;

/// Service options
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    /// Argo CD UI base URL used for links
    pub argocd_url: String,

    /// Environment of applications whose name carries no environment token
    pub default_environment: String,

    pub policy: SyncPolicy,

    /// Reported to callers when a sync is accepted
    pub estimated_sync_duration: Duration,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            argocd_url: "https://argocd.example.com".to_string(),
            default_environment: "production".to_string(),
            policy: SyncPolicy::default(),
            estimated_sync_duration: Duration::from_secs(6),
        }
    }
}

/// Errors of an application with the actions that may fix them
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub errors: Vec<DeploymentError>,
    pub recovery_actions: Vec<RecoveryAction>,
}

/// Upstream connectivity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub healthy: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Deployment status service
pub struct DeploymentStatusService {
    api: Arc<dyn ArgoCdApi>,
    cache: Arc<dyn StatusStore>,
    tracker: Arc<SyncOperationTracker>,
    classifier: ErrorClassifier,
    options: ServiceOptions,
}

impl DeploymentStatusService {
    pub fn new(
        api: Arc<dyn ArgoCdApi>,
        cache: Arc<dyn StatusStore>,
        tracker: Arc<SyncOperationTracker>,
        options: ServiceOptions,
    ) -> Self {
        Self {
            api,
            cache,
            tracker,
            classifier: ErrorClassifier::new(&options.argocd_url),
            options,
        }
    }

    /// Status of the entity's application. `Ok(None)` when the entity has no
    /// Argo CD annotation.
    pub async fn get_status(
        &self,
        entity: &Entity,
        caller: &str,
    ) -> Result<Option<DeploymentStatus>, BridgeError> {
        let Some(app) = entity.argocd_app_name() else {
            debug!("Entity {} has no Argo CD application", entity.name);
            return Ok(None);
        };

        let environment = self.environment_of(app);
        let status = self.fetch_status(app, &environment).await;
        Ok(Some(status.for_caller(self.can_user_sync(caller))))
    }

    /// Status of `app`, degraded to Unknown when Argo CD cannot be queried.
    /// Degraded statuses are not cached.
    pub async fn fetch_status(&self, app: &str, environment: &str) -> DeploymentStatus {
        match self.lookup(app, environment).await {
            Ok(status) => status,
            Err(e) => {
                warn!("Unable to fetch status of {}: {}", app, e);
                let error = self.classifier.classify(&e.detail(), app, environment);
                DeploymentStatus::unknown(app, environment, error)
            }
        }
    }

    /// Status of the entity's application in every environment. Environments
    /// that cannot be queried are left out; `Ok(None)` when none resolve.
    pub async fn get_multi_environment_status(
        &self,
        entity: &Entity,
        caller: &str,
    ) -> Result<Option<MultiEnvironmentStatus>, BridgeError> {
        let Some(base_name) = entity.argocd_app_name() else {
            return Ok(None);
        };
        let can_sync = self.can_user_sync(caller);

        let lookups = ENVIRONMENTS.iter().map(|environment| async move {
            let app = environment_application_name(base_name, environment);
            let result = self.lookup(&app, environment).await;
            (*environment, app, result)
        });

        let mut multi = MultiEnvironmentStatus::new(entity.name.clone());
        for (environment, app, result) in join_all(lookups).await {
            match result {
                Ok(status) => {
                    multi
                        .environments
                        .insert(environment.to_string(), status.for_caller(can_sync));
                }
                Err(e) => {
                    warn!("Skipping {} ({}): {}", app, environment, e);
                }
            }
        }

        if multi.is_empty() {
            return Ok(None);
        }
        Ok(Some(multi))
    }

    /// Queue a manual sync. Returns as soon as the operation is recorded.
    pub async fn sync_application(
        &self,
        app: &str,
        environment: Option<&str>,
        options: SyncOptions,
        caller: &str,
    ) -> Result<SyncResult, BridgeError> {
        if !self.can_user_sync(caller) {
            warn!("Sync of {} denied for {}", app, caller);
            return Err(BridgeError::PermissionDenied(format!(
                "{} is not allowed to sync {}",
                caller, app
            )));
        }

        // An explicit environment retargets the sync at that environment's application
        let (app, environment) = match environment {
            Some(environment) => {
                if !ENVIRONMENTS.contains(&environment) {
                    return Err(BridgeError::InvalidRequest(format!(
                        "Unknown environment {}, expected one of {}",
                        environment,
                        ENVIRONMENTS.join(", ")
                    )));
                }
                (
                    environment_application_name(app, environment),
                    environment.to_string(),
                )
            }
            None => (app.to_string(), self.environment_of(app)),
        };

        let operation = self
            .tracker
            .create_operation(&app, &environment, caller, options)
            .await;
        self.cache.invalidate(&app).await;

        info!(
            "Sync {} of {} ({}) accepted for {}",
            operation.sync_id, app, environment, caller
        );

        Ok(SyncResult {
            success: operation.status != SyncOperationStatus::Failed,
            sync_id: operation.sync_id.clone(),
            operation,
            estimated_duration: self.options.estimated_sync_duration.as_millis() as u64,
        })
    }

    pub async fn get_sync_status(&self, sync_id: &str) -> Option<ManualSyncOperation> {
        self.tracker.get_status(sync_id).await
    }

    pub async fn get_sync_history(&self, app: &str, limit: usize) -> Vec<ManualSyncOperation> {
        self.tracker.get_history(app, limit).await
    }

    /// Current errors of the entity's application with recovery actions
    pub async fn get_errors(
        &self,
        entity: &Entity,
        caller: &str,
    ) -> Result<Option<ErrorReport>, BridgeError> {
        let Some(status) = self.get_status(entity, caller).await? else {
            return Ok(None);
        };

        let recovery_actions = collect_recovery_actions(&status.errors);
        Ok(Some(ErrorReport {
            errors: status.errors,
            recovery_actions,
        }))
    }

    /// Probe Argo CD
    pub async fn health_check(&self) -> HealthReport {
        match self.api.version().await {
            Ok(version) => HealthReport {
                healthy: true,
                version: Some(version),
                error: None,
            },
            Err(e) => {
                warn!("Argo CD health check failed: {}", e);
                HealthReport {
                    healthy: false,
                    version: None,
                    error: Some(e.detail()),
                }
            }
        }
    }

    pub fn application_url(&self, app: &str) -> String {
        format!(
            "{}/applications/{}",
            self.options.argocd_url.trim_end_matches('/'),
            app
        )
    }

    pub fn logs_url(&self, app: &str) -> String {
        self.classifier.log_url(app)
    }

    pub fn can_user_sync(&self, caller: &str) -> bool {
        self.options.policy.allows(caller)
    }

    fn environment_of(&self, app: &str) -> String {
        infer_environment(app, &self.options.default_environment)
    }

    async fn lookup(&self, app: &str, environment: &str) -> Result<DeploymentStatus, BridgeError> {
        if let Some(status) = self.cache.get(app).await {
            debug!("Status cache hit for {}", app);
            return Ok(status);
        }

        let snapshot = self.api.fetch_application(app).await?;
        let status = self.to_status(snapshot, environment);
        self.cache.set(app, status.clone()).await;
        Ok(status)
    }

    fn to_status(&self, snapshot: ApplicationSnapshot, environment: &str) -> DeploymentStatus {
        let errors = snapshot
            .error_messages
            .iter()
            .map(|message| self.classifier.classify(message, &snapshot.name, environment))
            .collect();

        DeploymentStatus {
            application_name: snapshot.name,
            health: snapshot.health,
            sync: snapshot.sync,
            last_sync_time: snapshot.last_sync_time,
            environment: environment.to_string(),
            namespace: snapshot.namespace,
            errors,
            can_sync: false,
        }
    }
}
