//! Error types for the Argo CD bridge

use thiserror::Error;

/// Main error type for the bridge
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Shutdown error: {0}")]
    ShutdownError(String),

    #[error("Argo CD error: {0}")]
    UpstreamError(String),

    #[error("Catalog error: {0}")]
    CatalogError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

impl From<url::ParseError> for BridgeError {
    fn from(err: url::ParseError) -> Self {
        BridgeError::ConfigError(format!("invalid URL: {}", err))
    }
}

impl BridgeError {
    /// Message without the variant prefix, for upstream-originated errors
    pub fn detail(&self) -> String {
        match self {
            BridgeError::UpstreamError(msg) | BridgeError::CatalogError(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}
