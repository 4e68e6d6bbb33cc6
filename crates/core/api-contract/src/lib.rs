//! 稳定的 DTO 与 API 响应契约。
//!
//! 查询参数与返回字段保持 snake_case（与既有看板客户端一致）。

use serde::{Deserialize, Serialize};

/// 标准 API 响应封装。
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

/// 失败响应的错误体。
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

/// 健康检查返回。
#[derive(Debug, Serialize)]
pub struct HealthDto {
    pub status: String,
}

/// 口令换取 token 请求（表单）。
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub username: String,
    pub password: String,
}

/// token 返回。
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// 单条样本。
#[derive(Debug, Serialize)]
pub struct SampleDto {
    pub id: i64,
    pub device_id: String,
    pub key: String,
    pub value: f64,
    pub timestamp: String,
    pub timestamp_source: String,
}

/// 按 key 分组的最新值。
#[derive(Debug, Serialize)]
pub struct LatestValueDto {
    pub value: f64,
    pub timestamp: String,
}

/// 聚合点（仅均值）。
#[derive(Debug, Serialize)]
pub struct AggregatedPointDto {
    pub timestamp: String,
    pub average: f64,
}

/// 聚合点（均值 + 极值）。
#[derive(Debug, Serialize)]
pub struct AggregatedBucketDto {
    pub timestamp: String,
    pub average: f64,
    pub maximum: f64,
    pub minimum: f64,
    pub count: i64,
}

/// MQTT 连接状态。
#[derive(Debug, Serialize)]
pub struct ConnectionStatusDto {
    pub connected: bool,
    pub last_result_code: Option<i32>,
    pub last_change_at: Option<String>,
}

/// 采集计数快照。
#[derive(Debug, Serialize)]
pub struct MetricsSnapshotDto {
    pub messages_received: u64,
    pub messages_ignored: u64,
    pub messages_malformed: u64,
    pub messages_dropped_unknown_device: u64,
    pub samples_decoded: u64,
    pub samples_written: u64,
    pub batches_committed: u64,
    pub write_failures: u64,
    pub write_latency_ms_total: u64,
    pub write_latency_ms_count: u64,
    pub connects: u64,
    pub disconnects: u64,
    pub connect_failures: u64,
}

/// 设备区间查询参数。
#[derive(Debug, Deserialize)]
pub struct MeasurementsQuery {
    pub device_id: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

/// 设备查询参数。
#[derive(Debug, Deserialize)]
pub struct DeviceQuery {
    pub device_id: Option<String>,
}

/// 单 key 时序查询参数。
#[derive(Debug, Deserialize)]
pub struct TimeseriesQuery {
    pub device_id: Option<String>,
    pub key: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

/// 聚合查询参数。`interval` 为 hour|day|week，缺省 hour。
#[derive(Debug, Deserialize)]
pub struct AggregatedQuery {
    pub device_id: Option<String>,
    pub key: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub interval: Option<String>,
}

/// 多设备聚合查询参数。`device_ids` 为逗号分隔列表。
#[derive(Debug, Deserialize)]
pub struct MultiAggregatedQuery {
    pub device_ids: Option<String>,
    pub key: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub interval: Option<String>,
}

/// 最近数据查询参数。
#[derive(Debug, Deserialize)]
pub struct DataQuery {
    pub limit: Option<i64>,
}
