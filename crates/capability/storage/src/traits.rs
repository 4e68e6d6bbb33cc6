//! 存储接口 Trait 定义
//!
//! 设计原则：
//! - 所有接口返回 StorageError
//! - 使用 async_trait 支持动态分发（写入端与查询端共享同一实例）

use crate::error::StorageError;
use crate::models::AggregateRecord;
use async_trait::async_trait;
use domain::{Sample, SampleDraft, TimeBucket, TimeRange};

/// 传感器样本存储接口
#[async_trait]
pub trait SampleStore: Send + Sync {
    /// 在一个事务内追加一批样本，返回带 id 的样本。
    ///
    /// 任一样本被拒绝时整批回滚，不写入任何行。
    async fn append_batch(&self, drafts: Vec<SampleDraft>) -> Result<Vec<Sample>, StorageError>;

    /// 设备在时间范围内的全部样本（按时间升序）。
    async fn list_by_device(
        &self,
        device_id: &str,
        range: TimeRange,
    ) -> Result<Vec<Sample>, StorageError>;

    /// 设备每个 key 的最新样本（时间相同取 id 最大者），按 key 排序。
    async fn latest_per_key(&self, device_id: &str) -> Result<Vec<Sample>, StorageError>;

    /// 设备单个 key 在时间范围内的样本（按时间升序）。
    async fn timeseries(
        &self,
        device_id: &str,
        key: &str,
        range: TimeRange,
    ) -> Result<Vec<Sample>, StorageError>;

    /// 按时间桶聚合，每个非空桶一行，按设备、桶起点升序。
    async fn aggregate(
        &self,
        device_ids: &[String],
        key: &str,
        range: TimeRange,
        bucket: TimeBucket,
    ) -> Result<Vec<AggregateRecord>, StorageError>;

    /// 最新写入的样本（按时间倒序）。
    async fn recent(&self, limit: i64) -> Result<Vec<Sample>, StorageError>;
}
