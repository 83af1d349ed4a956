//! API handlers for the tracelog server.

use crate::middleware::Caller;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracelog_core::DynTracingService;
use tracelog_types::{Identity, LogEntry, Service, TracingError};

/// Request body for service registration.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeRequest {
    /// Identity of the service to register.
    pub service_id: String,
}

/// Request body for recording a log entry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddLogRequest {
    pub action: String,
    pub data_id: String,
    pub data_name: String,
    pub user_id: String,
}

/// Request body for log verification.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub user_id: String,
    pub data_id: String,
    pub action: String,
}

/// Response body for log verification.
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    /// Whether the matching entry's fields agree with its composite hash.
    pub valid: bool,
}

/// Response body for identity generation.
#[derive(Debug, Serialize, Deserialize)]
pub struct IdResponse {
    pub id: Identity,
}

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A domain error returned by the tracing service.
    #[error(transparent)]
    Tracing(#[from] TracingError),
    /// The request named no caller.
    #[error("missing caller identity")]
    MissingCaller,
    /// The host failed around the service call.
    #[error("internal server error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Tracing(TracingError::InvalidPayload(format!(
            "Invalid request body: {}",
            rejection.body_text()
        )))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::Tracing(err) => {
                let status = match err {
                    TracingError::NotFound(_) => StatusCode::NOT_FOUND,
                    TracingError::Conflict(_) => StatusCode::CONFLICT,
                    TracingError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
                    TracingError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
                };
                (status, err)
            }
            ApiError::MissingCaller => (StatusCode::UNAUTHORIZED, TracingError::unauthorized()),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, TracingError::unknown())
            }
        };

        let body = Json(serde_json::json!({
            "error": error
        }));

        (status, body).into_response()
    }
}

/// Runs `op` against the shared service on the blocking pool.
///
/// The service lock is held for the whole operation, so every call is
/// serialized.
async fn with_service<T, F>(state: Arc<AppState>, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&mut DynTracingService) -> Result<T, TracingError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut service = state
            .service
            .lock()
            .map_err(|_| ApiError::Internal("tracing service lock poisoned".to_string()))?;
        op(&mut service).map_err(ApiError::from)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("task join error: {}", e)))?
}

/// Handler for `POST /api/services`.
pub async fn initialize_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(Caller(caller)): Extension<Caller>,
    payload: Result<Json<InitializeRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Service>), ApiError> {
    let Json(payload) = payload?;
    let service = with_service(state, move |svc| {
        svc.initialize(&caller, Identity::new(payload.service_id))
    })
    .await?;
    Ok((StatusCode::CREATED, Json(service)))
}

/// Handler for `POST /api/logs`.
pub async fn add_log_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(Caller(caller)): Extension<Caller>,
    payload: Result<Json<AddLogRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LogEntry>), ApiError> {
    let Json(payload) = payload?;
    let entry = with_service(state, move |svc| {
        svc.add_log(
            &caller,
            &payload.action,
            &payload.data_id,
            &payload.data_name,
            &payload.user_id,
        )
    })
    .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Handler for `GET /api/logs`.
pub async fn get_logs_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(Caller(caller)): Extension<Caller>,
) -> Result<Json<Vec<LogEntry>>, ApiError> {
    with_service(state, move |svc| svc.get_logs(&caller))
        .await
        .map(Json)
}

/// Handler for `GET /api/logs/action/{action}`.
pub async fn get_logs_by_action_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(Caller(caller)): Extension<Caller>,
    Path(action): Path<String>,
) -> Result<Json<Vec<LogEntry>>, ApiError> {
    with_service(state, move |svc| svc.get_logs_by_action(&caller, &action))
        .await
        .map(Json)
}

/// Handler for `GET /api/logs/user/{userId}`.
pub async fn get_logs_by_user_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(Caller(caller)): Extension<Caller>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<LogEntry>>, ApiError> {
    with_service(state, move |svc| svc.get_logs_by_user(&caller, &user_id))
        .await
        .map(Json)
}

/// Handler for `GET /api/logs/data/{dataId}`.
pub async fn get_logs_by_data_id_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(Caller(caller)): Extension<Caller>,
    Path(data_id): Path<String>,
) -> Result<Json<Vec<LogEntry>>, ApiError> {
    with_service(state, move |svc| svc.get_logs_by_data_id(&caller, &data_id))
        .await
        .map(Json)
}

/// Handler for `GET /api/logs/user/{userId}/data/{dataId}`.
pub async fn get_logs_by_user_and_data_id_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(Caller(caller)): Extension<Caller>,
    Path((user_id, data_id)): Path<(String, String)>,
) -> Result<Json<Vec<LogEntry>>, ApiError> {
    with_service(state, move |svc| {
        svc.get_logs_by_user_and_data_id(&caller, &user_id, &data_id)
    })
    .await
    .map(Json)
}

/// Handler for `GET /api/logs/data/{dataId}/action/{action}`.
pub async fn get_logs_by_data_id_and_action_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(Caller(caller)): Extension<Caller>,
    Path((data_id, action)): Path<(String, String)>,
) -> Result<Json<Vec<LogEntry>>, ApiError> {
    with_service(state, move |svc| {
        svc.get_logs_by_data_id_and_action(&caller, &data_id, &action)
    })
    .await
    .map(Json)
}

/// Handler for `POST /api/logs/verify`.
pub async fn verify_log_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(Caller(caller)): Extension<Caller>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let Json(payload) = payload?;
    let valid = with_service(state, move |svc| {
        svc.verify_log(&caller, &payload.user_id, &payload.data_id, &payload.action)
    })
    .await?;
    Ok(Json(VerifyResponse { valid }))
}

/// Handler for `GET /api/ids`.
pub async fn generate_id_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(Caller(caller)): Extension<Caller>,
) -> Result<Json<IdResponse>, ApiError> {
    let id = with_service(state, move |svc| svc.generate_id(&caller)).await?;
    Ok(Json(IdResponse { id }))
}
