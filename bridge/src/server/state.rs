//! Server state

use std::sync::Arc;

use crate::app::state::AppState;
use crate::catalog::EntityLookup;
use crate::service::deployment::DeploymentStatusService;

/// Server state shared across handlers
pub struct ServerState {
    pub service: Arc<DeploymentStatusService>,
    pub catalog: Arc<dyn EntityLookup>,
}

impl ServerState {
    pub fn new(service: Arc<DeploymentStatusService>, catalog: Arc<dyn EntityLookup>) -> Self {
        Self { service, catalog }
    }
}

impl From<&AppState> for ServerState {
    fn from(state: &AppState) -> Self {
        Self::new(state.service.clone(), state.catalog.clone())
    }
}
