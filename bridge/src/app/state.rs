//! Application state management

use std::sync::Arc;

use tracing::info;

use crate::app::options::{AppOptions, ArgoCdOptions, CatalogOptions};
use crate::argocd::simulated::SimulatedArgoCd;
use crate::argocd::ArgoCdApi;
use crate::cache::status::StatusCache;
use crate::catalog::{EntityLookup, StaticCatalog};
use crate::diagnose::classifier::ErrorClassifier;
use crate::errors::BridgeError;
use crate::http::argocd::ArgoCdHttpApi;
use crate::http::catalog::CatalogHttpLookup;
use crate::http::client::{HttpClient, DEFAULT_TIMEOUT};
use crate::service::deployment::{DeploymentStatusService, ServiceOptions};
use crate::storage::settings::{ArgoCdMode, CatalogMode};
use crate::sync::tracker::{SyncJobReceiver, SyncOperationTracker};

/// Main application state
pub struct AppState {
    /// Argo CD upstream
    pub argocd: Arc<dyn ArgoCdApi>,

    /// Catalog lookup
    pub catalog: Arc<dyn EntityLookup>,

    /// Manual sync operations
    pub tracker: Arc<SyncOperationTracker>,

    /// Deployment status service
    pub service: Arc<DeploymentStatusService>,
}

impl AppState {
    /// Initialize application state from options. The returned receiver
    /// feeds the sync runner worker.
    pub fn init(options: &AppOptions) -> Result<(Self, SyncJobReceiver), BridgeError> {
        info!("Initializing application state...");

        let argocd = init_argocd(&options.argocd)?;
        let catalog = init_catalog(&options.catalog)?;
        Ok(Self::with_upstreams(argocd, catalog, options))
    }

    /// Assemble state around the given upstreams
    pub fn with_upstreams(
        argocd: Arc<dyn ArgoCdApi>,
        catalog: Arc<dyn EntityLookup>,
        options: &AppOptions,
    ) -> (Self, SyncJobReceiver) {
        let classifier = ErrorClassifier::new(&options.argocd.ui_url);
        let (tracker, jobs) = SyncOperationTracker::new(classifier);
        let tracker = Arc::new(tracker);

        let service = Arc::new(DeploymentStatusService::new(
            argocd.clone(),
            Arc::new(StatusCache::new(options.cache_ttl)),
            tracker.clone(),
            ServiceOptions {
                argocd_url: options.argocd.ui_url.clone(),
                default_environment: options.default_environment.clone(),
                policy: options.policy.clone(),
                estimated_sync_duration: options.sync_runner.executor.estimated_duration(),
            },
        ));

        let state = Self {
            argocd,
            catalog,
            tracker,
            service,
        };
        (state, jobs)
    }
}

fn init_argocd(options: &ArgoCdOptions) -> Result<Arc<dyn ArgoCdApi>, BridgeError> {
    match options.mode {
        ArgoCdMode::Simulated => {
            info!("Using simulated Argo CD");
            Ok(Arc::new(SimulatedArgoCd::new()))
        }
        ArgoCdMode::Live => {
            info!("Using Argo CD at {}", options.base_url);
            let client =
                HttpClient::new(&options.base_url, options.token.clone(), options.timeout)?;
            Ok(Arc::new(ArgoCdHttpApi::new(client)))
        }
    }
}

fn init_catalog(options: &CatalogOptions) -> Result<Arc<dyn EntityLookup>, BridgeError> {
    match options.mode {
        CatalogMode::Static => {
            info!("Using static catalog with {} entities", options.entities.len());
            Ok(Arc::new(StaticCatalog::new(options.entities.clone())))
        }
        CatalogMode::Http => {
            let base_url = options.base_url.as_deref().ok_or_else(|| {
                BridgeError::ConfigError("catalog.base_url is required in http mode".to_string())
            })?;
            info!("Using catalog at {}", base_url);
            let client = HttpClient::new(base_url, options.token.clone(), DEFAULT_TIMEOUT)?;
            Ok(Arc::new(CatalogHttpLookup::new(client)))
        }
    }
}
