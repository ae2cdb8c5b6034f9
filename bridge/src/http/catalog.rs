//! Portal catalog API client

use async_trait::async_trait;
use upstream_models::models::catalog::CatalogEntity;

use crate::catalog::{Entity, EntityLookup};
use crate::errors::BridgeError;
use crate::http::client::{encode_segment, HttpClient};

impl HttpClient {
    /// Get a component entity from the default namespace
    pub async fn get_component_entity(&self, name: &str) -> Result<CatalogEntity, BridgeError> {
        let path = format!(
            "/api/catalog/entities/by-name/component/default/{}",
            encode_segment(name)
        );
        self.get(&path).await
    }
}

/// [`EntityLookup`] backed by the portal catalog REST API
pub struct CatalogHttpLookup {
    client: HttpClient,
}

impl CatalogHttpLookup {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl EntityLookup for CatalogHttpLookup {
    async fn get_entity_by_name(&self, name: &str) -> Result<Option<Entity>, BridgeError> {
        match self.client.get_component_entity(name).await {
            Ok(entity) => Ok(Some(Entity {
                name: entity.metadata.name,
                annotations: entity.metadata.annotations,
            })),
            Err(BridgeError::NotFound(_)) => Ok(None),
            Err(e) => Err(BridgeError::CatalogError(e.to_string())),
        }
    }
}
