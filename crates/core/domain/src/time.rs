//! 时间戳规整：外部宽松格式 → UTC 毫秒。

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

// 小于该值按秒解释，否则按毫秒（1e11 秒约为 5138 年）。
const EPOCH_MS_THRESHOLD: f64 = 1e11;

/// 解析时间字符串，返回 UTC 毫秒。
///
/// 支持 RFC 3339（任意时区偏移）、无时区的日期时间（按 UTC）、仅日期，
/// 以及纯数字的纪元秒/毫秒。无法识别时返回 `None`。
pub fn parse_timestamp(value: &str) -> Option<i64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.timestamp_millis());
    }
    if let Ok(parsed) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(parsed.timestamp_millis());
    }
    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed.and_utc().timestamp_millis());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|datetime| datetime.and_utc().timestamp_millis());
    }
    value.parse::<f64>().ok().and_then(parse_epoch_number)
}

/// 纪元数值（秒或毫秒）转毫秒。
pub fn parse_epoch_number(value: f64) -> Option<i64> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let ms = if value >= EPOCH_MS_THRESHOLD {
        value
    } else {
        value * 1000.0
    };
    if ms > i64::MAX as f64 {
        return None;
    }
    Some(ms.round() as i64)
}

/// 毫秒格式化为 RFC 3339（UTC，`Z` 结尾，毫秒非零时保留小数）。
pub fn format_timestamp_ms(ts_ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(ts_ms) {
        Some(datetime) => datetime.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        None => ts_ms.to_string(),
    }
}

/// 当前 UTC 时间（毫秒）。
pub fn now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}
