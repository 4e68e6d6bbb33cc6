//! 样本查询 handlers
//!
//! - GET /measurements：设备在时间范围内的全部样本
//! - GET /latest_measurements：设备每个 key 的最新样本
//! - GET /latest_measurements_grouped：同上，按 key 组织为对象
//! - GET /data：最近写入的样本

use crate::AppState;
use crate::middleware::require_access;
use crate::utils::response::{sample_to_dto, storage_error};
use crate::utils::{normalize_required, parse_limit, parse_range};
use api_contract::{ApiResponse, DataQuery, DeviceQuery, LatestValueDto, MeasurementsQuery, SampleDto};
use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use domain::format_timestamp_ms;
use std::collections::BTreeMap;

pub async fn list_measurements(
    State(state): State<AppState>,
    Query(query): Query<MeasurementsQuery>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_access(&state, &headers) {
        return response;
    }
    let device_id = match normalize_required(query.device_id, "device_id") {
        Ok(value) => value,
        Err(response) => return response,
    };
    let range = match parse_range(query.start, query.end) {
        Ok(range) => range,
        Err(response) => return response,
    };
    match state.store.list_by_device(&device_id, range).await {
        Ok(items) => {
            let data: Vec<SampleDto> = items.into_iter().map(sample_to_dto).collect();
            (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
        }
        Err(err) => storage_error(err),
    }
}

pub async fn latest_measurements(
    State(state): State<AppState>,
    Query(query): Query<DeviceQuery>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_access(&state, &headers) {
        return response;
    }
    let device_id = match normalize_required(query.device_id, "device_id") {
        Ok(value) => value,
        Err(response) => return response,
    };
    match state.store.latest_per_key(&device_id).await {
        Ok(items) => {
            let data: Vec<SampleDto> = items.into_iter().map(sample_to_dto).collect();
            (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
        }
        Err(err) => storage_error(err),
    }
}

/// 最新值按 key 分组：`{ key: { value, timestamp } }`。
pub async fn latest_measurements_grouped(
    State(state): State<AppState>,
    Query(query): Query<DeviceQuery>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_access(&state, &headers) {
        return response;
    }
    let device_id = match normalize_required(query.device_id, "device_id") {
        Ok(value) => value,
        Err(response) => return response,
    };
    match state.store.latest_per_key(&device_id).await {
        Ok(items) => {
            let data: BTreeMap<String, LatestValueDto> = items
                .into_iter()
                .map(|sample| {
                    (
                        sample.key,
                        LatestValueDto {
                            value: sample.value,
                            timestamp: format_timestamp_ms(sample.ts_ms),
                        },
                    )
                })
                .collect();
            (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
        }
        Err(err) => storage_error(err),
    }
}

pub async fn recent_data(
    State(state): State<AppState>,
    Query(query): Query<DataQuery>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_access(&state, &headers) {
        return response;
    }
    let limit = match parse_limit(query.limit) {
        Ok(limit) => limit,
        Err(response) => return response,
    };
    match state.store.recent(limit).await {
        Ok(items) => {
            let data: Vec<SampleDto> = items.into_iter().map(sample_to_dto).collect();
            (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
        }
        Err(err) => storage_error(err),
    }
}
