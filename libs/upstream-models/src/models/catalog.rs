//! Portal catalog models

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Catalog entity as returned by `GET /api/catalog/entities/by-name/...`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntity {
    #[serde(default)]
    pub api_version: Option<String>,

    #[serde(default)]
    pub kind: Option<String>,

    pub metadata: EntityMetadata,
}

/// Entity metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub name: String,

    #[serde(default)]
    pub namespace: Option<String>,

    #[serde(default)]
    pub annotations: HashMap<String, String>,
}
