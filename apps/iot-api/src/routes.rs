//! 路由定义
//!
//! - 健康检查：/health
//! - 认证：/token
//! - 样本查询：/measurements, /latest_measurements, /latest_measurements_grouped, /data
//! - 时序与聚合：/timeseries, /timeseries/aggregated, /timeseries/aggregated/full,
//!   /timeseries/aggregated/multi
//! - 运行状态：/mqtt/status, /metrics

use super::AppState;
use super::handlers::*;
use axum::{
    Router,
    routing::{get, post},
};

/// 创建 API 路由（路径兼容带尾部斜杠的旧客户端）。
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/token", post(issue_token))
        .route("/mqtt/status", get(mqtt_status))
        .route("/metrics", get(get_metrics))
        .route("/measurements", get(list_measurements))
        .route("/measurements/", get(list_measurements))
        .route("/latest_measurements", get(latest_measurements))
        .route("/latest_measurements/", get(latest_measurements))
        .route("/latest_measurements_grouped", get(latest_measurements_grouped))
        .route("/latest_measurements_grouped/", get(latest_measurements_grouped))
        .route("/timeseries", get(timeseries))
        .route("/timeseries/", get(timeseries))
        .route("/timeseries/aggregated", get(timeseries_aggregated))
        .route("/timeseries/aggregated/", get(timeseries_aggregated))
        .route("/timeseries/aggregated/full", get(timeseries_aggregated_full))
        .route("/timeseries/aggregated/full/", get(timeseries_aggregated_full))
        .route("/timeseries/aggregated/multi", get(timeseries_aggregated_multi))
        .route("/timeseries/aggregated/multi/", get(timeseries_aggregated_multi))
        .route("/data", get(recent_data))
        .route("/data/", get(recent_data))
}
