//! HTTP request handlers

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::catalog::Entity;
use crate::errors::BridgeError;
use crate::models::diagnosis::{DeploymentError, RecoveryAction};
use crate::models::status::{DeploymentStatus, MultiEnvironmentStatus};
use crate::models::sync::{ManualSyncOperation, SyncOptions, SyncResult};
use crate::server::state::ServerState;
use crate::service::policy::ANONYMOUS_CALLER;
use crate::utils::version_info;

/// Header carrying the portal user making the request
pub const CALLER_HEADER: &str = "x-portal-user";

/// Default number of operations returned by the history endpoint
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

// ================================== ERRORS ======================================= //

/// Error body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Handler error rendered as an [`ErrorResponse`]
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: &'static str,
    message: String,
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            error: "not_found",
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: "bad_request",
            message: message.into(),
        }
    }
}

impl From<BridgeError> for ApiError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::NotFound(msg) => Self::not_found(msg),
            BridgeError::InvalidRequest(msg) => Self::bad_request(msg),
            BridgeError::PermissionDenied(msg) => Self {
                status: StatusCode::FORBIDDEN,
                error: "permission_denied",
                message: msg,
            },
            other => {
                error!("Request failed: {}", other);
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    error: "internal_error",
                    message: other.to_string(),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.error.to_string(),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

fn caller(headers: &HeaderMap) -> String {
    headers
        .get(CALLER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(ANONYMOUS_CALLER)
        .to_string()
}

fn missing_annotation(service_name: &str) -> ApiError {
    ApiError::not_found(format!(
        "No Argo CD application annotation found for {}",
        service_name
    ))
}

async fn resolve_entity(state: &ServerState, service_name: &str) -> Result<Entity, ApiError> {
    state
        .catalog
        .get_entity_by_name(service_name)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Entity {} not found", service_name)))
}

/// Entity and its Argo CD application name
async fn resolve_application(
    state: &ServerState,
    service_name: &str,
) -> Result<(Entity, String), ApiError> {
    let entity = resolve_entity(state, service_name).await?;
    let app = entity
        .argocd_app_name()
        .map(str::to_string)
        .ok_or_else(|| missing_annotation(service_name))?;
    Ok((entity, app))
}

// ================================== HEALTH ======================================= //

/// Upstream health handler
pub async fn health_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let report = state.service.health_check().await;
    let status = if report.healthy {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    (status, Json(report))
}

/// Version response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionResponse {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Version handler
pub async fn version_handler() -> impl IntoResponse {
    let version = version_info();
    Json(VersionResponse {
        version: version.version,
        git_hash: version.git_hash,
        build_time: version.build_time,
    })
}

// ================================== STATUS ======================================= //

/// Single environment status response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub service_name: String,
    pub status: DeploymentStatus,
    pub application_url: String,
    pub logs_url: String,
}

/// Status handler
pub async fn status_handler(
    State(state): State<Arc<ServerState>>,
    Path(service_name): Path<String>,
    headers: HeaderMap,
) -> Result<Json<StatusResponse>, ApiError> {
    let entity = resolve_entity(&state, &service_name).await?;
    let status = state
        .service
        .get_status(&entity, &caller(&headers))
        .await?
        .ok_or_else(|| missing_annotation(&service_name))?;

    Ok(Json(StatusResponse {
        service_name,
        application_url: state.service.application_url(&status.application_name),
        logs_url: state.service.logs_url(&status.application_name),
        status,
    }))
}

/// Links for one environment
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentUrls {
    pub application_url: String,
    pub logs_url: String,
}

/// Multi-environment status response
#[derive(Debug, Serialize)]
pub struct EnvironmentsResponse {
    #[serde(flatten)]
    pub status: MultiEnvironmentStatus,
    pub urls: BTreeMap<String, EnvironmentUrls>,
}

/// Multi-environment status handler
pub async fn environments_handler(
    State(state): State<Arc<ServerState>>,
    Path(service_name): Path<String>,
    headers: HeaderMap,
) -> Result<Json<EnvironmentsResponse>, ApiError> {
    let entity = resolve_entity(&state, &service_name).await?;
    if entity.argocd_app_name().is_none() {
        return Err(missing_annotation(&service_name));
    }

    let status = state
        .service
        .get_multi_environment_status(&entity, &caller(&headers))
        .await?
        .ok_or_else(|| {
            ApiError::not_found(format!("No environment of {} could be resolved", service_name))
        })?;

    let urls = status
        .environments
        .iter()
        .map(|(environment, env_status)| {
            let app = &env_status.application_name;
            let urls = EnvironmentUrls {
                application_url: state.service.application_url(app),
                logs_url: state.service.logs_url(app),
            };
            (environment.clone(), urls)
        })
        .collect();

    Ok(Json(EnvironmentsResponse { status, urls }))
}

/// Logs links response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsResponse {
    pub logs_url: String,
    pub application_url: String,
}

/// Logs links handler
pub async fn logs_handler(
    State(state): State<Arc<ServerState>>,
    Path(service_name): Path<String>,
) -> Result<Json<LogsResponse>, ApiError> {
    let (_, app) = resolve_application(&state, &service_name).await?;
    Ok(Json(LogsResponse {
        logs_url: state.service.logs_url(&app),
        application_url: state.service.application_url(&app),
    }))
}

/// Errors response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorsResponse {
    pub errors: Vec<DeploymentError>,
    pub recovery_actions: Vec<RecoveryAction>,
    pub application_url: String,
}

/// Errors and recovery actions handler
pub async fn errors_handler(
    State(state): State<Arc<ServerState>>,
    Path(service_name): Path<String>,
    headers: HeaderMap,
) -> Result<Json<ErrorsResponse>, ApiError> {
    let (entity, app) = resolve_application(&state, &service_name).await?;
    let report = state
        .service
        .get_errors(&entity, &caller(&headers))
        .await?
        .ok_or_else(|| missing_annotation(&service_name))?;

    Ok(Json(ErrorsResponse {
        errors: report.errors,
        recovery_actions: report.recovery_actions,
        application_url: state.service.application_url(&app),
    }))
}

// =================================== SYNC ======================================== //

/// Sync request body. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub environment: Option<String>,

    #[serde(default)]
    pub prune: bool,

    #[serde(default)]
    pub dry_run: bool,

    #[serde(default)]
    pub force: bool,
}

/// Accepted sync response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    #[serde(flatten)]
    pub result: SyncResult,
    pub application_url: String,
}

/// Manual sync handler
pub async fn sync_handler(
    State(state): State<Arc<ServerState>>,
    Path(service_name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SyncResponse>, ApiError> {
    let request: SyncRequest = if body.is_empty() {
        SyncRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            warn!("Invalid sync request for {}: {}", service_name, e);
            ApiError::bad_request(format!("Invalid sync request: {}", e))
        })?
    };

    let (_, app) = resolve_application(&state, &service_name).await?;
    let options = SyncOptions {
        prune: request.prune,
        dry_run: request.dry_run,
        force: request.force,
    };

    let result = state
        .service
        .sync_application(
            &app,
            request.environment.as_deref(),
            options,
            &caller(&headers),
        )
        .await?;

    let application_url = state
        .service
        .application_url(&result.operation.application_name);
    Ok(Json(SyncResponse {
        result,
        application_url,
    }))
}

/// Sync operation response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatusResponse {
    pub sync_id: String,
    pub operation: ManualSyncOperation,
    pub application_url: String,
}

/// Sync operation status handler
pub async fn sync_status_handler(
    State(state): State<Arc<ServerState>>,
    Path(sync_id): Path<String>,
) -> Result<Json<SyncStatusResponse>, ApiError> {
    let operation = state
        .service
        .get_sync_status(&sync_id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("Sync operation {} not found", sync_id)))?;

    Ok(Json(SyncStatusResponse {
        application_url: state.service.application_url(&operation.application_name),
        sync_id,
        operation,
    }))
}

/// History query parameters
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// Sync history response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncHistoryResponse {
    pub history: Vec<ManualSyncOperation>,
    pub application_url: String,
}

/// Sync history handler
pub async fn sync_history_handler(
    State(state): State<Arc<ServerState>>,
    Path(service_name): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<SyncHistoryResponse>, ApiError> {
    let (_, app) = resolve_application(&state, &service_name).await?;
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);

    Ok(Json(SyncHistoryResponse {
        history: state.service.get_sync_history(&app, limit).await,
        application_url: state.service.application_url(&app),
    }))
}
