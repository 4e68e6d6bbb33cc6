//! 采集计数快照
//!
//! - GET /metrics

use api_contract::{ApiResponse, MetricsSnapshotDto};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use iot_telemetry::metrics;

use crate::{AppState, middleware::require_access};

pub async fn get_metrics(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(response) = require_access(&state, &headers) {
        return response;
    }

    let snapshot = metrics().snapshot();
    (
        StatusCode::OK,
        Json(ApiResponse::success(MetricsSnapshotDto {
            messages_received: snapshot.messages_received,
            messages_ignored: snapshot.messages_ignored,
            messages_malformed: snapshot.messages_malformed,
            messages_dropped_unknown_device: snapshot.messages_dropped_unknown_device,
            samples_decoded: snapshot.samples_decoded,
            samples_written: snapshot.samples_written,
            batches_committed: snapshot.batches_committed,
            write_failures: snapshot.write_failures,
            write_latency_ms_total: snapshot.write_latency_ms_total,
            write_latency_ms_count: snapshot.write_latency_ms_count,
            connects: snapshot.connects,
            disconnects: snapshot.disconnects,
            connect_failures: snapshot.connect_failures,
        })),
    )
        .into_response()
}
