//! 上行报文解码：JSON 报文 → 设备标识 + 时间戳 + 数值样本。
//!
//! 解码为纯函数，不做 I/O；系统 topic 与坏报文都只产出零个样本。

use domain::{SampleDraft, TimestampSource, parse_epoch_number, parse_timestamp};
use serde_json::{Map, Value};

// 字段候选路径，按顺序取第一个有效值（ChirpStack v3 在前，v4 在后）。
const DEVICE_ID_PATHS: &[&[&str]] = &[&["devEUI"], &["deviceInfo", "devEui"]];
const TIMESTAMP_PATHS: &[&[&str]] = &[&["time"], &["receivedAt"]];
const MEASUREMENT_PATHS: &[&[&str]] = &[&["objectJSON"], &["object"]];

/// 解码错误。
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("payload is not valid utf-8: {0}")]
    InvalidUtf8(String),
    #[error("payload is not valid json: {0}")]
    InvalidJson(String),
    #[error("payload top level is not a json object")]
    NotAnObject,
    #[error("measurement container is not a json object: {0}")]
    InvalidContainer(String),
}

/// 判断 topic 是否属于 broker 保留命名空间（`$` 开头）。
pub fn is_reserved_topic(topic: &str) -> bool {
    topic.starts_with('$')
}

/// 一条上行消息的解码结果。
#[derive(Debug, Clone, PartialEq)]
pub struct Uplink {
    pub device_id: Option<String>,
    pub ts_ms: i64,
    pub ts_source: TimestampSource,
    pub measurements: Map<String, Value>,
}

impl Uplink {
    /// 转换为样本迭代器；缺少设备标识且策略为丢弃时返回 `None`。
    pub fn into_samples(self, unknown: UnknownDevice) -> Option<Samples> {
        let Uplink {
            device_id,
            ts_ms,
            ts_source,
            measurements,
        } = self;
        let device_id = match (device_id, unknown) {
            (Some(device_id), _) => device_id,
            (None, UnknownDevice::StoreAsEmpty) => String::new(),
            (None, UnknownDevice::Drop) => return None,
        };
        Some(Samples {
            device_id,
            ts_ms,
            ts_source,
            entries: measurements.into_iter(),
        })
    }
}

/// 缺少设备标识时的处理策略。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownDevice {
    #[default]
    Drop,
    /// 以空字符串作为设备标识入库。
    StoreAsEmpty,
}

/// 一条消息的解码结论。
#[derive(Debug)]
pub enum Decoded {
    /// 系统 topic，不产出样本。
    Reserved,
    /// 缺少设备标识，按策略丢弃。
    DeviceMissing,
    Samples(Samples),
}

/// 单条消息的样本迭代器（惰性、有限、不可重放）。
#[derive(Debug)]
pub struct Samples {
    device_id: String,
    ts_ms: i64,
    ts_source: TimestampSource,
    entries: serde_json::map::IntoIter,
}

impl Iterator for Samples {
    type Item = SampleDraft;

    fn next(&mut self) -> Option<Self::Item> {
        for (key, value) in self.entries.by_ref() {
            // 布尔、字符串、null、数组、对象静默跳过。
            if let Some(value) = numeric_value(&value) {
                return Some(SampleDraft {
                    device_id: self.device_id.clone(),
                    key,
                    value,
                    ts_ms: self.ts_ms,
                    ts_source: self.ts_source,
                });
            }
        }
        None
    }
}

fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64().filter(|value| value.is_finite()),
        _ => None,
    }
}

/// 解码一条消息。
///
/// - 系统 topic 返回 `Ok(None)`；
/// - 报文不是 JSON 对象或测量容器非法时返回错误；
/// - 缺少测量容器时返回不含测量项的 `Uplink`。
pub fn decode(
    topic: &str,
    payload: &[u8],
    received_at_ms: i64,
) -> Result<Option<Uplink>, DecodeError> {
    if is_reserved_topic(topic) {
        return Ok(None);
    }
    let text =
        std::str::from_utf8(payload).map_err(|err| DecodeError::InvalidUtf8(err.to_string()))?;
    let root: Value =
        serde_json::from_str(text).map_err(|err| DecodeError::InvalidJson(err.to_string()))?;
    let root = match root {
        Value::Object(root) => root,
        _ => return Err(DecodeError::NotAnObject),
    };

    let device_id = DEVICE_ID_PATHS
        .iter()
        .filter_map(|path| lookup(&root, path))
        .find_map(|value| match value {
            Value::String(value) if !value.trim().is_empty() => Some(value.trim().to_string()),
            _ => None,
        });

    let (ts_ms, ts_source) = match TIMESTAMP_PATHS
        .iter()
        .filter_map(|path| lookup(&root, path))
        .find_map(timestamp_value)
    {
        Some(ts_ms) => (ts_ms, TimestampSource::Device),
        None => (received_at_ms, TimestampSource::Receipt),
    };

    let measurements = match MEASUREMENT_PATHS
        .iter()
        .find_map(|path| lookup(&root, path).filter(|value| !value.is_null()))
    {
        Some(container) => measurement_container(container)?,
        None => Map::new(),
    };

    Ok(Some(Uplink {
        device_id,
        ts_ms,
        ts_source,
        measurements,
    }))
}

/// 解码并按未知设备策略产出样本，采集链路的唯一入口。
pub fn decode_samples(
    topic: &str,
    payload: &[u8],
    received_at_ms: i64,
    unknown: UnknownDevice,
) -> Result<Decoded, DecodeError> {
    let uplink = match decode(topic, payload, received_at_ms)? {
        Some(uplink) => uplink,
        None => return Ok(Decoded::Reserved),
    };
    Ok(match uplink.into_samples(unknown) {
        Some(samples) => Decoded::Samples(samples),
        None => Decoded::DeviceMissing,
    })
}

fn lookup<'a>(root: &'a Map<String, Value>, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut current = root.get(*first)?;
    for segment in rest {
        current = current.as_object()?.get(*segment)?;
    }
    Some(current)
}

fn timestamp_value(value: &Value) -> Option<i64> {
    match value {
        Value::String(value) => parse_timestamp(value),
        Value::Number(number) => number.as_f64().and_then(parse_epoch_number),
        _ => None,
    }
}

fn measurement_container(container: &Value) -> Result<Map<String, Value>, DecodeError> {
    match container {
        Value::Object(map) => Ok(map.clone()),
        // v3 的 objectJSON 是字符串形式的 JSON 对象。
        Value::String(text) if text.trim().is_empty() => Ok(Map::new()),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(DecodeError::InvalidContainer(
                "string container is not an object".to_string(),
            )),
            Err(err) => Err(DecodeError::InvalidContainer(err.to_string())),
        },
        other => Err(DecodeError::InvalidContainer(format!(
            "unexpected {}",
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
