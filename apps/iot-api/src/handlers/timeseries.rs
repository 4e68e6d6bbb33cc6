//! 时序与聚合 handlers
//!
//! - GET /timeseries：单设备单 key 的原始点
//! - GET /timeseries/aggregated：按时间桶求均值
//! - GET /timeseries/aggregated/full：均值、极值与样本数
//! - GET /timeseries/aggregated/multi：多设备同一 key 的完整聚合
//!
//! 聚合只返回非空桶，桶起点按 UTC 对齐（周桶从周一开始）。

use crate::AppState;
use crate::middleware::require_access;
use crate::utils::response::{sample_to_dto, storage_error};
use crate::utils::{normalize_required, parse_device_ids, parse_interval, parse_range};
use api_contract::{
    AggregatedBucketDto, AggregatedPointDto, AggregatedQuery, ApiResponse, MultiAggregatedQuery,
    SampleDto, TimeseriesQuery,
};
use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use domain::{TimeBucket, TimeRange, format_timestamp_ms};
use iot_storage::AggregateRecord;
use std::collections::BTreeMap;

struct AggregateParams {
    device_id: String,
    key: String,
    range: TimeRange,
    bucket: TimeBucket,
}

fn parse_aggregate_query(query: AggregatedQuery) -> Result<AggregateParams, Response> {
    let device_id = normalize_required(query.device_id, "device_id")?;
    let key = normalize_required(query.key, "key")?;
    let range = parse_range(query.start, query.end)?;
    let bucket = parse_interval(query.interval)?;
    Ok(AggregateParams {
        device_id,
        key,
        range,
        bucket,
    })
}

fn bucket_to_dto(record: AggregateRecord) -> AggregatedBucketDto {
    AggregatedBucketDto {
        timestamp: format_timestamp_ms(record.bucket_ms),
        average: record.average,
        maximum: record.maximum,
        minimum: record.minimum,
        count: record.count,
    }
}

pub async fn timeseries(
    State(state): State<AppState>,
    Query(query): Query<TimeseriesQuery>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_access(&state, &headers) {
        return response;
    }
    let device_id = match normalize_required(query.device_id, "device_id") {
        Ok(value) => value,
        Err(response) => return response,
    };
    let key = match normalize_required(query.key, "key") {
        Ok(value) => value,
        Err(response) => return response,
    };
    let range = match parse_range(query.start, query.end) {
        Ok(range) => range,
        Err(response) => return response,
    };
    match state.store.timeseries(&device_id, &key, range).await {
        Ok(items) => {
            let data: Vec<SampleDto> = items.into_iter().map(sample_to_dto).collect();
            (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
        }
        Err(err) => storage_error(err),
    }
}

pub async fn timeseries_aggregated(
    State(state): State<AppState>,
    Query(query): Query<AggregatedQuery>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_access(&state, &headers) {
        return response;
    }
    let params = match parse_aggregate_query(query) {
        Ok(params) => params,
        Err(response) => return response,
    };
    match state
        .store
        .aggregate(&[params.device_id], &params.key, params.range, params.bucket)
        .await
    {
        Ok(records) => {
            let data: Vec<AggregatedPointDto> = records
                .into_iter()
                .map(|record| AggregatedPointDto {
                    timestamp: format_timestamp_ms(record.bucket_ms),
                    average: record.average,
                })
                .collect();
            (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
        }
        Err(err) => storage_error(err),
    }
}

pub async fn timeseries_aggregated_full(
    State(state): State<AppState>,
    Query(query): Query<AggregatedQuery>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_access(&state, &headers) {
        return response;
    }
    let params = match parse_aggregate_query(query) {
        Ok(params) => params,
        Err(response) => return response,
    };
    match state
        .store
        .aggregate(&[params.device_id], &params.key, params.range, params.bucket)
        .await
    {
        Ok(records) => {
            let data: Vec<AggregatedBucketDto> = records.into_iter().map(bucket_to_dto).collect();
            (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
        }
        Err(err) => storage_error(err),
    }
}

/// 多设备聚合：`{ device_id: [bucket, ...] }`，无数据的设备返回空数组。
pub async fn timeseries_aggregated_multi(
    State(state): State<AppState>,
    Query(query): Query<MultiAggregatedQuery>,
    headers: HeaderMap,
) -> Response {
    if let Err(response) = require_access(&state, &headers) {
        return response;
    }
    let device_ids = match parse_device_ids(query.device_ids) {
        Ok(value) => value,
        Err(response) => return response,
    };
    let key = match normalize_required(query.key, "key") {
        Ok(value) => value,
        Err(response) => return response,
    };
    let range = match parse_range(query.start, query.end) {
        Ok(range) => range,
        Err(response) => return response,
    };
    let bucket = match parse_interval(query.interval) {
        Ok(bucket) => bucket,
        Err(response) => return response,
    };
    match state.store.aggregate(&device_ids, &key, range, bucket).await {
        Ok(records) => {
            let mut data: BTreeMap<String, Vec<AggregatedBucketDto>> = device_ids
                .into_iter()
                .map(|device_id| (device_id, Vec::new()))
                .collect();
            for record in records {
                data.entry(record.device_id.clone())
                    .or_default()
                    .push(bucket_to_dto(record));
            }
            (StatusCode::OK, Json(ApiResponse::success(data))).into_response()
        }
        Err(err) => storage_error(err),
    }
}
