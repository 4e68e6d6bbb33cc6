//! 输入验证辅助函数
//!
//! 失败一律返回 bad_request_error 响应。

use crate::utils::response::bad_request_error;
use axum::response::Response;
use domain::{TimeBucket, TimeRange, parse_timestamp};

const DEFAULT_DATA_LIMIT: i64 = 100;
const MAX_DATA_LIMIT: i64 = 5000;

/// 验证必填字段，去除空格并检查非空
pub fn normalize_required(value: Option<String>, field: &str) -> Result<String, Response> {
    let trimmed = value.as_deref().map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Err(bad_request_error(format!("{field} required")));
    }
    Ok(trimmed.to_string())
}

/// 解析必填时间参数（与报文时间戳相同的格式）
pub fn parse_time_param(value: Option<String>, field: &str) -> Result<i64, Response> {
    let value = normalize_required(value, field)?;
    parse_timestamp(&value).ok_or_else(|| bad_request_error(format!("{field} must be a timestamp")))
}

/// 解析 start/end，要求 start <= end
pub fn parse_range(start: Option<String>, end: Option<String>) -> Result<TimeRange, Response> {
    let from_ms = parse_time_param(start, "start")?;
    let to_ms = parse_time_param(end, "end")?;
    if from_ms > to_ms {
        return Err(bad_request_error("start must be <= end"));
    }
    Ok(TimeRange::new(from_ms, to_ms))
}

/// 解析聚合粒度，缺省为 hour
pub fn parse_interval(value: Option<String>) -> Result<TimeBucket, Response> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(TimeBucket::Hour),
        Some(value) => TimeBucket::parse(value)
            .ok_or_else(|| bad_request_error("interval must be hour|day|week")),
    }
}

/// 解析逗号分隔的设备列表（去空、去重、保持顺序）
pub fn parse_device_ids(value: Option<String>) -> Result<Vec<String>, Response> {
    let value = normalize_required(value, "device_ids")?;
    let mut device_ids: Vec<String> = Vec::new();
    for item in value.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        if !device_ids.iter().any(|existing| existing == item) {
            device_ids.push(item.to_string());
        }
    }
    if device_ids.is_empty() {
        return Err(bad_request_error("device_ids required"));
    }
    Ok(device_ids)
}

/// 最近数据条数，缺省 100，范围 1..=5000
pub fn parse_limit(value: Option<i64>) -> Result<i64, Response> {
    let limit = value.unwrap_or(DEFAULT_DATA_LIMIT);
    if !(1..=MAX_DATA_LIMIT).contains(&limit) {
        return Err(bad_request_error("limit out of range"));
    }
    Ok(limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn interval_defaults_to_hour() {
        assert_eq!(parse_interval(None).ok(), Some(TimeBucket::Hour));
        assert_eq!(
            parse_interval(Some("Week".to_string())).ok(),
            Some(TimeBucket::Week)
        );
        let response = parse_interval(Some("minute".to_string())).expect_err("invalid");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn range_rejects_start_after_end() {
        let response = parse_range(
            Some("2024-05-02T00:00:00Z".to_string()),
            Some("2024-05-01T00:00:00Z".to_string()),
        )
        .expect_err("invalid");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let range = parse_range(
            Some("2024-05-01".to_string()),
            Some("2024-05-01T12:34:56Z".to_string()),
        )
        .ok()
        .expect("range");
        assert_eq!(range.from_ms, 1_714_521_600_000);
        assert_eq!(range.to_ms, 1_714_566_896_000);
    }

    #[test]
    fn device_ids_are_split_and_deduplicated() {
        let ids = parse_device_ids(Some(" a, b,,a ".to_string()))
            .ok()
            .expect("ids");
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
        assert!(parse_device_ids(Some(" , ".to_string())).is_err());
        assert!(parse_device_ids(None).is_err());
    }

    #[test]
    fn limit_bounds() {
        assert_eq!(parse_limit(None).ok(), Some(100));
        assert!(parse_limit(Some(0)).is_err());
        assert!(parse_limit(Some(5001)).is_err());
        assert_eq!(parse_limit(Some(5000)).ok(), Some(5000));
    }
}
