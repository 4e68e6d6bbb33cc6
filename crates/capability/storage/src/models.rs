//! 数据模型

/// 单个设备、单个时间桶的聚合结果。
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRecord {
    pub device_id: String,
    /// 桶起点（毫秒）。
    pub bucket_ms: i64,
    pub average: f64,
    pub minimum: f64,
    pub maximum: f64,
    pub count: i64,
}
