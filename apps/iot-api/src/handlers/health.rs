//! 运行状态 handlers
//!
//! - GET /health
//! - GET /mqtt/status

use crate::AppState;
use crate::middleware::require_access;
use api_contract::{ApiResponse, ConnectionStatusDto, HealthDto};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use domain::format_timestamp_ms;

/// 健康检查，无需认证。
pub async fn health() -> Response {
    (
        StatusCode::OK,
        Json(ApiResponse::success(HealthDto {
            status: "running".to_string(),
        })),
    )
        .into_response()
}

/// 当前 MQTT 连接状态（订阅任务最近一次登记的结果）。
pub async fn mqtt_status(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = require_access(&state, &headers) {
        return response;
    }
    let status = state.status.snapshot();
    (
        StatusCode::OK,
        Json(ApiResponse::success(ConnectionStatusDto {
            connected: status.connected,
            last_result_code: status.last_result_code,
            last_change_at: status.last_change_at_ms.map(format_timestamp_ms),
        })),
    )
        .into_response()
}
