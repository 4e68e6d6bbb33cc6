/// 时间戳来源：设备上报时间，或缺失时回退的接收时间。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampSource {
    Device,
    Receipt,
}

impl TimestampSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimestampSource::Device => "device",
            TimestampSource::Receipt => "receipt",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "device" => Some(TimestampSource::Device),
            "receipt" => Some(TimestampSource::Receipt),
            _ => None,
        }
    }
}

/// 待写入的样本（解码输出，尚未分配 id）。
#[derive(Debug, Clone, PartialEq)]
pub struct SampleDraft {
    pub device_id: String,
    pub key: String,
    pub value: f64,
    pub ts_ms: i64,
    pub ts_source: TimestampSource,
}

/// 已持久化的样本。`id` 由存储在插入时分配，之后不可变。
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub id: i64,
    pub device_id: String,
    pub key: String,
    pub value: f64,
    pub ts_ms: i64,
    pub ts_source: TimestampSource,
}

impl Sample {
    pub fn from_draft(id: i64, draft: SampleDraft) -> Self {
        Self {
            id,
            device_id: draft.device_id,
            key: draft.key,
            value: draft.value,
            ts_ms: draft.ts_ms,
            ts_source: draft.ts_source,
        }
    }
}

/// 传输连接状态（仅保留最近一次变更）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub last_result_code: Option<i32>,
    pub last_change_at_ms: Option<i64>,
}

/// 闭区间时间范围（毫秒）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub from_ms: i64,
    pub to_ms: i64,
}

impl TimeRange {
    pub fn new(from_ms: i64, to_ms: i64) -> Self {
        Self { from_ms, to_ms }
    }

    pub fn contains(&self, ts_ms: i64) -> bool {
        ts_ms >= self.from_ms && ts_ms <= self.to_ms
    }
}

const HOUR_MS: i64 = 3_600_000;
const DAY_MS: i64 = 24 * HOUR_MS;
const WEEK_MS: i64 = 7 * DAY_MS;
// 1970-01-05 是周一，周桶从周一 00:00 UTC 开始。
const WEEK_ORIGIN_MS: i64 = 4 * DAY_MS;

/// 聚合时间桶宽度。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBucket {
    Hour,
    Day,
    Week,
}

impl TimeBucket {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hour" => Some(TimeBucket::Hour),
            "day" => Some(TimeBucket::Day),
            "week" => Some(TimeBucket::Week),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeBucket::Hour => "hour",
            TimeBucket::Day => "day",
            TimeBucket::Week => "week",
        }
    }

    /// TimescaleDB `time_bucket` 使用的 interval 字面量。
    pub fn interval(&self) -> &'static str {
        match self {
            TimeBucket::Hour => "1 hour",
            TimeBucket::Day => "1 day",
            TimeBucket::Week => "1 week",
        }
    }

    pub fn width_ms(&self) -> i64 {
        match self {
            TimeBucket::Hour => HOUR_MS,
            TimeBucket::Day => DAY_MS,
            TimeBucket::Week => WEEK_MS,
        }
    }

    /// 计算时间戳所在桶的起点（毫秒）。
    pub fn bucket_start(&self, ts_ms: i64) -> i64 {
        let width = self.width_ms();
        let origin = match self {
            TimeBucket::Week => WEEK_ORIGIN_MS,
            _ => 0,
        };
        (ts_ms - origin).div_euclid(width) * width + origin
    }
}
