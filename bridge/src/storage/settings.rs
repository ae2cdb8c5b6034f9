//! Settings file management

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::Entity;
use crate::errors::BridgeError;
use crate::filesys::file::File;
use crate::logs::LogLevel;
use crate::service::policy::SyncPolicy;

/// Default location of the settings file
pub const DEFAULT_SETTINGS_PATH: &str = "/etc/argobridge/settings.json";

/// Bridge settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit JSON logs on stdout
    #[serde(default)]
    pub json_logs: bool,

    /// Directory for rolling log files
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerSettings,

    /// Argo CD configuration
    #[serde(default)]
    pub argocd: ArgoCdSettings,

    /// Status cache configuration
    #[serde(default)]
    pub cache: CacheSettings,

    /// Sync execution configuration
    #[serde(default)]
    pub sync: SyncSettings,

    /// Who may trigger manual syncs
    #[serde(default)]
    pub policy: SyncPolicy,

    /// Catalog configuration
    #[serde(default)]
    pub catalog: CatalogSettings,

    /// Environment assumed for application names without an environment suffix
    #[serde(default = "default_environment")]
    pub default_environment: String,
}

fn default_environment() -> String {
    "production".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            json_logs: false,
            log_dir: None,
            server: ServerSettings::default(),
            argocd: ArgoCdSettings::default(),
            cache: CacheSettings::default(),
            sync: SyncSettings::default(),
            policy: SyncPolicy::default(),
            catalog: CatalogSettings::default(),
            default_environment: default_environment(),
        }
    }
}

impl Settings {
    /// Read settings from `file`. A missing file yields the defaults.
    pub async fn load(file: &File) -> Result<Self, BridgeError> {
        if !file.exists().await {
            warn!(
                "Settings file {} not found, using defaults",
                file.path().display()
            );
            return Ok(Self::default());
        }
        file.read_json::<Settings>().await
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    7007
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// How the bridge reaches Argo CD
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgoCdMode {
    /// In-process stand-in, no network
    #[default]
    Simulated,
    /// Argo CD REST API
    Live,
}

/// Argo CD settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgoCdSettings {
    #[serde(default)]
    pub mode: ArgoCdMode,

    /// API base URL
    #[serde(default = "default_argocd_url")]
    pub base_url: String,

    /// UI base URL used in links. Defaults to the API base URL.
    #[serde(default)]
    pub ui_url: Option<String>,

    /// Bearer token for the API
    #[serde(default)]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

fn default_argocd_url() -> String {
    "https://argocd.example.com".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for ArgoCdSettings {
    fn default() -> Self {
        Self {
            mode: ArgoCdMode::default(),
            base_url: default_argocd_url(),
            ui_url: None,
            token: None,
            timeout_secs: default_request_timeout(),
        }
    }
}

impl ArgoCdSettings {
    /// URL links point at
    pub fn ui_url(&self) -> &str {
        self.ui_url.as_deref().unwrap_or(&self.base_url)
    }
}

/// Status cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

fn default_cache_ttl() -> u64 {
    30
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
        }
    }
}

/// Sync execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Delay between sync phases in milliseconds
    #[serde(default = "default_phase_delay")]
    pub phase_delay_ms: u64,

    /// Deadline of a single sync in seconds
    #[serde(default = "default_deadline")]
    pub deadline_secs: u64,

    /// How long finished operations stay queryable, in seconds
    #[serde(default = "default_retention")]
    pub retention_secs: u64,

    /// Interval of the history cleanup, in seconds
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
}

fn default_phase_delay() -> u64 {
    2000
}

fn default_deadline() -> u64 {
    300
}

fn default_retention() -> u64 {
    86400
}

fn default_cleanup_interval() -> u64 {
    3600
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            phase_delay_ms: default_phase_delay(),
            deadline_secs: default_deadline(),
            retention_secs: default_retention(),
            cleanup_interval_secs: default_cleanup_interval(),
        }
    }
}

/// Where catalog entities come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogMode {
    /// Entities listed in this file
    #[default]
    Static,
    /// Backstage catalog API
    Http,
}

/// Catalog settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSettings {
    #[serde(default)]
    pub mode: CatalogMode,

    /// Catalog API base URL, required in `http` mode
    #[serde(default)]
    pub base_url: Option<String>,

    /// Bearer token for the catalog API
    #[serde(default)]
    pub token: Option<String>,

    /// Entities served in `static` mode
    #[serde(default)]
    pub entities: Vec<Entity>,
}
