//! 持久化：一条消息的样本作为一个整体写入。

use async_trait::async_trait;
use domain::{Sample, SampleDraft};
use iot_storage::SampleStore;
use std::sync::Arc;
use std::time::Instant;

/// 一批样本的写入结果。
#[derive(Debug, Clone, Default)]
pub struct WriteResult {
    pub samples: Vec<Sample>,
    pub latency_ms: u64,
}

impl WriteResult {
    pub fn written(&self) -> usize {
        self.samples.len()
    }
}

/// Pipeline 处理错误。
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("writer error: {0}")]
    Writer(String),
    #[error("sample rejected: {0}")]
    Rejected(String),
}

/// 样本批量写入器抽象。
///
/// 实现方保证整批原子：要么全部写入，要么不写入。
#[async_trait]
pub trait SampleWriter: Send + Sync {
    async fn write_batch(&self, drafts: Vec<SampleDraft>) -> Result<Vec<Sample>, PipelineError>;
}

/// 持久化入口。
#[derive(Clone)]
pub struct PersistenceSink {
    writer: Arc<dyn SampleWriter>,
}

impl PersistenceSink {
    pub fn new(writer: Arc<dyn SampleWriter>) -> Self {
        Self { writer }
    }

    /// 收集一条消息的全部样本并在一个事务内写入。
    ///
    /// 空批次不调用写入器。
    pub async fn persist<I>(&self, drafts: I) -> Result<WriteResult, PipelineError>
    where
        I: IntoIterator<Item = SampleDraft>,
    {
        let batch: Vec<SampleDraft> = drafts.into_iter().collect();
        if batch.is_empty() {
            return Ok(WriteResult::default());
        }
        let started = Instant::now();
        let samples = self.writer.write_batch(batch).await?;
        Ok(WriteResult {
            samples,
            latency_ms: started.elapsed().as_millis() as u64,
        })
    }
}

/// 基于存储层的写入器。
#[derive(Clone)]
pub struct StorageSampleWriter {
    store: Arc<dyn SampleStore>,
}

impl StorageSampleWriter {
    pub fn new(store: Arc<dyn SampleStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SampleWriter for StorageSampleWriter {
    async fn write_batch(&self, drafts: Vec<SampleDraft>) -> Result<Vec<Sample>, PipelineError> {
        self.store.append_batch(drafts).await.map_err(|err| {
            if err.is_validation() {
                PipelineError::Rejected(err.to_string())
            } else {
                PipelineError::Writer(err.to_string())
            }
        })
    }
}
