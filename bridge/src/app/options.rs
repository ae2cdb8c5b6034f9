//! Application configuration options

use std::time::Duration;

use secrecy::SecretString;

use crate::catalog::Entity;
use crate::service::policy::SyncPolicy;
use crate::storage::settings::{ArgoCdMode, CatalogMode, Settings};
use crate::sync::executor::ExecutorSettings;
use crate::workers::{janitor, sync_runner};

/// Main application options
#[derive(Debug, Clone)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Server configuration
    pub server: ServerOptions,

    /// Argo CD upstream
    pub argocd: ArgoCdOptions,

    /// Catalog lookup
    pub catalog: CatalogOptions,

    /// Status cache time-to-live
    pub cache_ttl: Duration,

    /// Who may trigger manual syncs
    pub policy: SyncPolicy,

    /// Environment assumed for application names without an environment suffix
    pub default_environment: String,

    /// Sync runner worker options
    pub sync_runner: sync_runner::Options,

    /// Janitor worker options
    pub janitor: janitor::Options,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            server: ServerOptions::default(),
            argocd: ArgoCdOptions::default(),
            catalog: CatalogOptions::default(),
            cache_ttl: Duration::from_secs(30),
            policy: SyncPolicy::default(),
            default_environment: "production".to_string(),
            sync_runner: sync_runner::Options::default(),
            janitor: janitor::Options::default(),
        }
    }
}

impl From<&Settings> for AppOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            lifecycle: LifecycleOptions::default(),
            server: ServerOptions {
                host: settings.server.host.clone(),
                port: settings.server.port,
            },
            argocd: ArgoCdOptions {
                mode: settings.argocd.mode,
                base_url: settings.argocd.base_url.clone(),
                ui_url: settings.argocd.ui_url().to_string(),
                token: settings.argocd.token.clone().map(SecretString::from),
                timeout: Duration::from_secs(settings.argocd.timeout_secs),
            },
            catalog: CatalogOptions {
                mode: settings.catalog.mode,
                base_url: settings.catalog.base_url.clone(),
                token: settings.catalog.token.clone().map(SecretString::from),
                entities: settings.catalog.entities.clone(),
            },
            cache_ttl: Duration::from_secs(settings.cache.ttl_secs),
            policy: settings.policy.clone(),
            default_environment: settings.default_environment.clone(),
            sync_runner: sync_runner::Options {
                executor: ExecutorSettings {
                    phase_delay: Duration::from_millis(settings.sync.phase_delay_ms),
                    deadline: Duration::from_secs(settings.sync.deadline_secs),
                },
            },
            janitor: janitor::Options {
                interval: Duration::from_secs(settings.sync.cleanup_interval_secs),
                retention: Duration::from_secs(settings.sync.retention_secs),
            },
        }
    }
}

/// Lifecycle options for the bridge
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}

/// HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7007,
        }
    }
}

/// Argo CD upstream options
#[derive(Debug, Clone)]
pub struct ArgoCdOptions {
    pub mode: ArgoCdMode,

    /// API base URL
    pub base_url: String,

    /// UI base URL used in links
    pub ui_url: String,

    pub token: Option<SecretString>,

    /// Request timeout
    pub timeout: Duration,
}

impl Default for ArgoCdOptions {
    fn default() -> Self {
        Self {
            mode: ArgoCdMode::Simulated,
            base_url: "https://argocd.example.com".to_string(),
            ui_url: "https://argocd.example.com".to_string(),
            token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Catalog lookup options
#[derive(Debug, Clone, Default)]
pub struct CatalogOptions {
    pub mode: CatalogMode,

    /// Catalog API base URL, required in HTTP mode
    pub base_url: Option<String>,

    pub token: Option<SecretString>,

    /// Entities served in static mode
    pub entities: Vec<Entity>,
}
