//! Catalog entity lookup

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::BridgeError;

/// Annotation naming the Argo CD application of a catalog entity
pub const ARGOCD_APP_ANNOTATION: &str = "argocd/app-name";

/// The parts of a catalog entity the bridge reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,

    #[serde(default)]
    pub annotations: HashMap<String, String>,
}

impl Entity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotations: HashMap::new(),
        }
    }

    pub fn with_annotation(mut self, key: &str, value: &str) -> Self {
        self.annotations.insert(key.to_string(), value.to_string());
        self
    }

    /// Argo CD application name, if annotated and non-blank
    pub fn argocd_app_name(&self) -> Option<&str> {
        self.annotations
            .get(ARGOCD_APP_ANNOTATION)
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
    }
}

/// Catalog lookup trait for testability
#[async_trait]
pub trait EntityLookup: Send + Sync {
    /// Find an entity by name. `Ok(None)` when the catalog has no such entity.
    async fn get_entity_by_name(&self, name: &str) -> Result<Option<Entity>, BridgeError>;
}

/// Catalog backed by a fixed entity list from the settings file
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    entities: HashMap<String, Entity>,
}

impl StaticCatalog {
    pub fn new(entities: impl IntoIterator<Item = Entity>) -> Self {
        Self {
            entities: entities.into_iter().map(|e| (e.name.clone(), e)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[async_trait]
impl EntityLookup for StaticCatalog {
    async fn get_entity_by_name(&self, name: &str) -> Result<Option<Entity>, BridgeError> {
        Ok(self.entities.get(name).cloned())
    }
}
