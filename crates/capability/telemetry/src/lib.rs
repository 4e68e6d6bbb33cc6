//! 追踪、请求 ID 生成与采集计数。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 采集计数快照。
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
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

/// 采集计数（进程内单调递增）。
pub struct IngestMetrics {
    messages_received: AtomicU64,
    messages_ignored: AtomicU64,
    messages_malformed: AtomicU64,
    messages_dropped_unknown_device: AtomicU64,
    samples_decoded: AtomicU64,
    samples_written: AtomicU64,
    batches_committed: AtomicU64,
    write_failures: AtomicU64,
    write_latency_ms_total: AtomicU64,
    write_latency_ms_count: AtomicU64,
    connects: AtomicU64,
    disconnects: AtomicU64,
    connect_failures: AtomicU64,
}

impl IngestMetrics {
    pub fn new() -> Self {
        Self {
            messages_received: AtomicU64::new(0),
            messages_ignored: AtomicU64::new(0),
            messages_malformed: AtomicU64::new(0),
            messages_dropped_unknown_device: AtomicU64::new(0),
            samples_decoded: AtomicU64::new(0),
            samples_written: AtomicU64::new(0),
            batches_committed: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            write_latency_ms_total: AtomicU64::new(0),
            write_latency_ms_count: AtomicU64::new(0),
            connects: AtomicU64::new(0),
            disconnects: AtomicU64::new(0),
            connect_failures: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_ignored: self.messages_ignored.load(Ordering::Relaxed),
            messages_malformed: self.messages_malformed.load(Ordering::Relaxed),
            messages_dropped_unknown_device: self
                .messages_dropped_unknown_device
                .load(Ordering::Relaxed),
            samples_decoded: self.samples_decoded.load(Ordering::Relaxed),
            samples_written: self.samples_written.load(Ordering::Relaxed),
            batches_committed: self.batches_committed.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            write_latency_ms_total: self.write_latency_ms_total.load(Ordering::Relaxed),
            write_latency_ms_count: self.write_latency_ms_count.load(Ordering::Relaxed),
            connects: self.connects.load(Ordering::Relaxed),
            disconnects: self.disconnects.load(Ordering::Relaxed),
            connect_failures: self.connect_failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for IngestMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<IngestMetrics> = OnceLock::new();

/// 获取全局计数实例。
pub fn metrics() -> &'static IngestMetrics {
    METRICS.get_or_init(IngestMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录收到的上行消息次数（含系统 topic）。
pub fn record_message_received() {
    metrics().messages_received.fetch_add(1, Ordering::Relaxed);
}

/// 记录被忽略的消息次数（系统 topic）。
pub fn record_message_ignored() {
    metrics().messages_ignored.fetch_add(1, Ordering::Relaxed);
}

/// 记录无法解码的消息次数。
pub fn record_message_malformed() {
    metrics().messages_malformed.fetch_add(1, Ordering::Relaxed);
}

/// 记录因缺少设备标识被丢弃的消息次数。
pub fn record_dropped_unknown_device() {
    metrics()
        .messages_dropped_unknown_device
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录解码出的样本数。
pub fn record_samples_decoded(count: u64) {
    metrics().samples_decoded.fetch_add(count, Ordering::Relaxed);
}

/// 记录写入成功的样本数。
pub fn record_samples_written(count: u64) {
    metrics().samples_written.fetch_add(count, Ordering::Relaxed);
}

/// 记录提交成功的事务数。
pub fn record_batch_committed() {
    metrics().batches_committed.fetch_add(1, Ordering::Relaxed);
}

/// 记录写入失败次数（整批回滚）。
pub fn record_write_failure() {
    metrics().write_failures.fetch_add(1, Ordering::Relaxed);
}

/// 记录写入延迟（毫秒）。
pub fn record_write_latency_ms(latency_ms: u64) {
    let metrics = metrics();
    metrics
        .write_latency_ms_total
        .fetch_add(latency_ms, Ordering::Relaxed);
    metrics
        .write_latency_ms_count
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录连接建立次数。
pub fn record_connect() {
    metrics().connects.fetch_add(1, Ordering::Relaxed);
}

/// 记录连接断开次数。
pub fn record_disconnect() {
    metrics().disconnects.fetch_add(1, Ordering::Relaxed);
}

/// 记录连接失败次数（拒绝或网络错误）。
pub fn record_connect_failure() {
    metrics().connect_failures.fetch_add(1, Ordering::Relaxed);
}
