//! Log handlers, gated by the `logs` permission

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use tracing::info;

use super::dto::{ClearedLogs, LogsResponse};
use crate::domain::GatewayError;
use crate::infrastructure::RequestLog;
use crate::interfaces::http::common::ApiResponse;
use crate::interfaces::http::middleware::AuthenticatedUser;

#[derive(Clone)]
pub struct LogsState {
    pub request_log: Arc<RequestLog>,
}

#[utoipa::path(
    get,
    path = "/logs",
    tag = "Logs",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Request log contents", body = LogsResponse),
        (status = 403, description = "Role lacks the logs permission"),
        (status = 500, description = "Log file could not be read")
    )
)]
pub async fn get_logs(State(state): State<LogsState>) -> Result<Json<LogsResponse>, GatewayError> {
    let logs = state.request_log.read_requests().await?;
    Ok(Json(LogsResponse { logs }))
}

#[utoipa::path(
    delete,
    path = "/clear_logs",
    tag = "Logs",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Request and metrics logs truncated", body = ApiResponse<ClearedLogs>),
        (status = 403, description = "Role lacks the logs permission"),
        (status = 500, description = "Log files could not be truncated")
    )
)]
pub async fn clear_logs(
    State(state): State<LogsState>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ApiResponse<ClearedLogs>>, GatewayError> {
    state.request_log.clear().await?;
    info!(username = %user.username(), "Logs cleared");

    Ok(Json(ApiResponse::success(ClearedLogs {
        message: "Logs cleared".to_string(),
    })))
}
