//! 样本存储内存实现
//!
//! 聚合在进程内按桶计算，桶边界与 TimescaleDB `time_bucket` 一致。

use crate::error::StorageError;
use crate::models::AggregateRecord;
use crate::traits::SampleStore;
use crate::validation::ensure_valid_draft;
use domain::{Sample, SampleDraft, TimeBucket, TimeRange};
use std::collections::BTreeMap;
use std::sync::RwLock;

struct InMemoryState {
    next_id: i64,
    samples: Vec<Sample>,
}

/// 样本内存存储
pub struct InMemorySampleStore {
    state: RwLock<InMemoryState>,
}

impl InMemorySampleStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(InMemoryState {
                next_id: 1,
                samples: Vec::new(),
            }),
        }
    }

    /// 当前累计的样本数量（用于测试）
    pub fn len(&self) -> usize {
        self.state.read().map(|state| state.samples.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn select<F>(&self, filter: F) -> Result<Vec<Sample>, StorageError>
    where
        F: Fn(&Sample) -> bool,
    {
        let state = self
            .state
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(state
            .samples
            .iter()
            .filter(|sample| filter(sample))
            .cloned()
            .collect())
    }
}

impl Default for InMemorySampleStore {
    fn default() -> Self {
        Self::new()
    }
}

fn sort_ascending(items: &mut [Sample]) {
    items.sort_by(|a, b| a.ts_ms.cmp(&b.ts_ms).then(a.id.cmp(&b.id)));
}

#[derive(Default)]
struct BucketAcc {
    sum: f64,
    minimum: f64,
    maximum: f64,
    count: i64,
}

impl BucketAcc {
    fn push(&mut self, value: f64) {
        if self.count == 0 {
            self.minimum = value;
            self.maximum = value;
        } else {
            self.minimum = self.minimum.min(value);
            self.maximum = self.maximum.max(value);
        }
        self.sum += value;
        self.count += 1;
    }
}

#[async_trait::async_trait]
impl SampleStore for InMemorySampleStore {
    async fn append_batch(&self, drafts: Vec<SampleDraft>) -> Result<Vec<Sample>, StorageError> {
        // 先整体校验，任一失败则不写入。
        for draft in &drafts {
            ensure_valid_draft(draft)?;
        }
        let mut state = self
            .state
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut persisted = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let sample = Sample::from_draft(state.next_id, draft);
            state.next_id += 1;
            state.samples.push(sample.clone());
            persisted.push(sample);
        }
        Ok(persisted)
    }

    async fn list_by_device(
        &self,
        device_id: &str,
        range: TimeRange,
    ) -> Result<Vec<Sample>, StorageError> {
        let mut items =
            self.select(|sample| sample.device_id == device_id && range.contains(sample.ts_ms))?;
        sort_ascending(&mut items);
        Ok(items)
    }

    async fn latest_per_key(&self, device_id: &str) -> Result<Vec<Sample>, StorageError> {
        let mut latest: BTreeMap<String, Sample> = BTreeMap::new();
        for sample in self.select(|sample| sample.device_id == device_id)? {
            let newer = match latest.get(&sample.key) {
                Some(current) => (sample.ts_ms, sample.id) > (current.ts_ms, current.id),
                None => true,
            };
            if newer {
                latest.insert(sample.key.clone(), sample);
            }
        }
        Ok(latest.into_values().collect())
    }

    async fn timeseries(
        &self,
        device_id: &str,
        key: &str,
        range: TimeRange,
    ) -> Result<Vec<Sample>, StorageError> {
        let mut items = self.select(|sample| {
            sample.device_id == device_id && sample.key == key && range.contains(sample.ts_ms)
        })?;
        sort_ascending(&mut items);
        Ok(items)
    }

    async fn aggregate(
        &self,
        device_ids: &[String],
        key: &str,
        range: TimeRange,
        bucket: TimeBucket,
    ) -> Result<Vec<AggregateRecord>, StorageError> {
        let selected = self.select(|sample| {
            sample.key == key
                && range.contains(sample.ts_ms)
                && device_ids.iter().any(|device_id| *device_id == sample.device_id)
        })?;

        let mut buckets: BTreeMap<(String, i64), BucketAcc> = BTreeMap::new();
        for sample in selected {
            let bucket_ms = bucket.bucket_start(sample.ts_ms);
            buckets
                .entry((sample.device_id, bucket_ms))
                .or_default()
                .push(sample.value);
        }

        Ok(buckets
            .into_iter()
            .map(|((device_id, bucket_ms), acc)| AggregateRecord {
                device_id,
                bucket_ms,
                average: acc.sum / acc.count as f64,
                minimum: acc.minimum,
                maximum: acc.maximum,
                count: acc.count,
            })
            .collect())
    }

    async fn recent(&self, limit: i64) -> Result<Vec<Sample>, StorageError> {
        let limit = limit.max(0) as usize;
        let mut items = self.select(|_| true)?;
        items.sort_by(|a, b| b.ts_ms.cmp(&a.ts_ms).then(b.id.cmp(&a.id)));
        items.truncate(limit);
        Ok(items)
    }
}
