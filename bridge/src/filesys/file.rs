//! Settings and other JSON files on disk

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tokio::fs;

use crate::errors::BridgeError;

#[derive(Debug, Clone)]
pub struct File {
    path: PathBuf,
}

impl File {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn exists(&self) -> bool {
        fs::try_exists(&self.path).await.unwrap_or(false)
    }

    pub async fn read_string(&self) -> Result<String, BridgeError> {
        Ok(fs::read_to_string(&self.path).await?)
    }

    /// Parse the file as JSON. Parse errors name the file and the
    /// offending line so a broken settings file is easy to locate.
    pub async fn read_json<T: DeserializeOwned>(&self) -> Result<T, BridgeError> {
        let contents = self.read_string().await?;
        serde_json::from_str(&contents).map_err(|e| {
            BridgeError::ConfigError(format!(
                "{} (line {}, column {}): {}",
                self.path.display(),
                e.line(),
                e.column(),
                e
            ))
        })
    }
}
