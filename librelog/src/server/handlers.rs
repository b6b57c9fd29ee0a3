//! HTTP route handlers for the librelog server.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::error::ApiError;
use super::metrics::Metrics;
use super::request::{CreateLogsetRequest, CreateTokenRequest, ExportParams, UpdateLogsetRequest};
use super::response::{LogsResponse, export_response};
use crate::LogDb;
use crate::export::export_stream;
use crate::model::{ApiKey, IssuedToken, Logset, OwnerId};
use crate::query::{QueryParams, query_logs};
use crate::reader::LogRead;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub log: Arc<LogDb>,
    pub metrics: Arc<Metrics>,
    /// Largest accepted ingest message, in bytes.
    pub max_message_bytes: usize,
}

/// Handle GET /api/v1/logsets/{id}/logs
pub async fn handle_query_logs(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    Path(id): Path<String>,
    Query(params): Query<QueryParams>,
) -> Result<LogsResponse, ApiError> {
    let records = query_logs(state.log.as_ref(), &owner, &id, &params).await?;
    state
        .metrics
        .records_queried_total
        .inc_by(records.len() as u64);
    Ok(LogsResponse(records))
}

/// Handle GET /api/v1/logsets/{id}/export
pub async fn handle_export(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    Path(id): Path<String>,
    Query(params): Query<ExportParams>,
) -> Result<Response, ApiError> {
    let logset = state.log.get_logset(&owner, &id).await?;
    let format = params.format();
    let reader: Arc<dyn LogRead> = state.log.clone();
    let stream = export_stream(reader, owner, logset.id.clone(), format);
    tracing::info!("Exporting logset {} as {:?}", logset.id, format);
    Ok(export_response(
        &logset.name,
        format,
        stream,
        state.metrics.clone(),
    ))
}

/// Handle GET /api/v1/logsets
pub async fn handle_list_logsets(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
) -> Result<Json<Vec<Logset>>, ApiError> {
    Ok(Json(state.log.list_logsets(&owner).await?))
}

/// Handle POST /api/v1/logsets
pub async fn handle_create_logset(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    Json(request): Json<CreateLogsetRequest>,
) -> Result<(StatusCode, Json<Logset>), ApiError> {
    let logset = state
        .log
        .create_logset(&owner, &request.name, &request.description)
        .await?;
    Ok((StatusCode::CREATED, Json(logset)))
}

/// Handle GET /api/v1/logsets/{id}
pub async fn handle_get_logset(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    Path(id): Path<String>,
) -> Result<Json<Logset>, ApiError> {
    Ok(Json(state.log.get_logset(&owner, &id).await?))
}

/// Handle PUT /api/v1/logsets/{id}
pub async fn handle_update_logset(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    Path(id): Path<String>,
    Json(request): Json<UpdateLogsetRequest>,
) -> Result<Json<Logset>, ApiError> {
    let logset = state
        .log
        .update_logset(
            &owner,
            &id,
            request.name.as_deref(),
            request.description.as_deref(),
        )
        .await?;
    Ok(Json(logset))
}

/// Handle DELETE /api/v1/logsets/{id}
pub async fn handle_delete_logset(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.log.delete_logset(&owner, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handle GET /api/v1/tokens
pub async fn handle_list_tokens(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
) -> Result<Json<Vec<ApiKey>>, ApiError> {
    Ok(Json(state.log.credentials().list(&owner).await?))
}

/// Handle POST /api/v1/tokens
///
/// The new token belongs to the caller. Its raw value appears only in this
/// response.
pub async fn handle_create_token(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    Json(request): Json<CreateTokenRequest>,
) -> Result<(StatusCode, Json<IssuedToken>), ApiError> {
    let issued = state
        .log
        .credentials()
        .issue(owner, &request.name)
        .await?;
    Ok((StatusCode::CREATED, Json(issued)))
}

/// Handle DELETE /api/v1/tokens/{hash}
pub async fn handle_revoke_token(
    State(state): State<AppState>,
    Extension(owner): Extension<OwnerId>,
    Path(hash): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.log.credentials().revoke(&owner, &hash).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handle GET /metrics
pub async fn handle_metrics(State(state): State<AppState>) -> Response {
    match state.metrics.encode() {
        Ok(body) => body.into_response(),
        Err(e) => {
            tracing::error!("Failed to encode metrics: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Handle GET /-/healthy
pub async fn handle_healthy() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

/// Handle GET /-/ready
pub async fn handle_ready() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
