//! Postgres 样本存储实现

use crate::error::StorageError;
use crate::models::AggregateRecord;
use crate::traits::SampleStore;
use crate::validation::ensure_valid_draft;
use domain::{Sample, SampleDraft, TimeBucket, TimeRange, TimestampSource};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

const SAMPLE_COLUMNS: &str = "id, device_id, key, value, \
     (extract(epoch from \"timestamp\") * 1000)::bigint as ts_ms, \
     timestamp_source";

pub struct PgSampleStore {
    pub pool: PgPool,
    timescale: bool,
}

impl PgSampleStore {
    pub fn new(pool: PgPool, timescale: bool) -> Self {
        Self { pool, timescale }
    }

    fn bucket_expr(&self, bucket: TimeBucket) -> String {
        if self.timescale {
            format!("time_bucket(interval '{}', \"timestamp\")", bucket.interval())
        } else {
            format!(
                "date_trunc('{}', \"timestamp\" at time zone 'UTC') at time zone 'UTC'",
                bucket.as_str()
            )
        }
    }
}

fn sample_from_row(row: &PgRow) -> Result<Sample, StorageError> {
    let source: String = row.try_get("timestamp_source")?;
    let ts_source = TimestampSource::parse(&source)
        .ok_or_else(|| StorageError::new(format!("unknown timestamp_source: {source}")))?;
    Ok(Sample {
        id: row.try_get("id")?,
        device_id: row.try_get("device_id")?,
        key: row.try_get("key")?,
        value: row.try_get("value")?,
        ts_ms: row.try_get("ts_ms")?,
        ts_source,
    })
}

fn samples_from_rows(rows: Vec<PgRow>) -> Result<Vec<Sample>, StorageError> {
    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        items.push(sample_from_row(&row)?);
    }
    Ok(items)
}

#[async_trait::async_trait]
impl SampleStore for PgSampleStore {
    async fn append_batch(&self, drafts: Vec<SampleDraft>) -> Result<Vec<Sample>, StorageError> {
        if drafts.is_empty() {
            return Ok(Vec::new());
        }
        for draft in &drafts {
            ensure_valid_draft(draft)?;
        }
        // 提前返回时 tx 被 drop，sqlx 自动回滚。
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(drafts.len());
        for draft in &drafts {
            let row = sqlx::query(
                "insert into sensor_data (device_id, key, value, \"timestamp\", timestamp_source) \
                 values ($1, $2, $3, to_timestamp($4 / 1000.0), $5) \
                 returning id",
            )
            .bind(&draft.device_id)
            .bind(&draft.key)
            .bind(draft.value)
            .bind(draft.ts_ms as f64)
            .bind(draft.ts_source.as_str())
            .fetch_one(&mut *tx)
            .await?;
            let id: i64 = row.try_get("id")?;
            ids.push(id);
        }
        tx.commit().await?;
        Ok(ids
            .into_iter()
            .zip(drafts)
            .map(|(id, draft)| Sample::from_draft(id, draft))
            .collect())
    }

    async fn list_by_device(
        &self,
        device_id: &str,
        range: TimeRange,
    ) -> Result<Vec<Sample>, StorageError> {
        let sql = format!(
            "select {SAMPLE_COLUMNS} \
             from sensor_data \
             where device_id = $1 \
             and \"timestamp\" >= to_timestamp($2 / 1000.0) \
             and \"timestamp\" <= to_timestamp($3 / 1000.0) \
             order by \"timestamp\" asc, id asc"
        );
        let rows = sqlx::query(&sql)
            .bind(device_id)
            .bind(range.from_ms as f64)
            .bind(range.to_ms as f64)
            .fetch_all(&self.pool)
            .await?;
        samples_from_rows(rows)
    }

    async fn latest_per_key(&self, device_id: &str) -> Result<Vec<Sample>, StorageError> {
        let sql = format!(
            "select distinct on (key) {SAMPLE_COLUMNS} \
             from sensor_data \
             where device_id = $1 \
             order by key asc, \"timestamp\" desc, id desc"
        );
        let rows = sqlx::query(&sql)
            .bind(device_id)
            .fetch_all(&self.pool)
            .await?;
        samples_from_rows(rows)
    }

    async fn timeseries(
        &self,
        device_id: &str,
        key: &str,
        range: TimeRange,
    ) -> Result<Vec<Sample>, StorageError> {
        let sql = format!(
            "select {SAMPLE_COLUMNS} \
             from sensor_data \
             where device_id = $1 \
             and key = $2 \
             and \"timestamp\" >= to_timestamp($3 / 1000.0) \
             and \"timestamp\" <= to_timestamp($4 / 1000.0) \
             order by \"timestamp\" asc, id asc"
        );
        let rows = sqlx::query(&sql)
            .bind(device_id)
            .bind(key)
            .bind(range.from_ms as f64)
            .bind(range.to_ms as f64)
            .fetch_all(&self.pool)
            .await?;
        samples_from_rows(rows)
    }

    async fn aggregate(
        &self,
        device_ids: &[String],
        key: &str,
        range: TimeRange,
        bucket: TimeBucket,
    ) -> Result<Vec<AggregateRecord>, StorageError> {
        if device_ids.is_empty() {
            return Ok(Vec::new());
        }
        let bucket_expr = self.bucket_expr(bucket);
        let sql = format!(
            "with filtered as ( \
                select device_id, value, {bucket_expr} as bucket_ts \
                from sensor_data \
                where device_id = any($1) \
                and key = $2 \
                and \"timestamp\" >= to_timestamp($3 / 1000.0) \
                and \"timestamp\" <= to_timestamp($4 / 1000.0) \
             ) \
             select device_id, \
               (extract(epoch from bucket_ts) * 1000)::bigint as bucket_ms, \
               avg(value) as average, \
               min(value) as minimum, \
               max(value) as maximum, \
               count(*) as sample_count \
             from filtered \
             group by device_id, bucket_ts \
             order by device_id asc, bucket_ts asc"
        );
        let rows = sqlx::query(&sql)
            .bind(device_ids)
            .bind(key)
            .bind(range.from_ms as f64)
            .bind(range.to_ms as f64)
            .fetch_all(&self.pool)
            .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(AggregateRecord {
                device_id: row.try_get("device_id")?,
                bucket_ms: row.try_get("bucket_ms")?,
                average: row.try_get("average")?,
                minimum: row.try_get("minimum")?,
                maximum: row.try_get("maximum")?,
                count: row.try_get("sample_count")?,
            });
        }
        Ok(items)
    }

    async fn recent(&self, limit: i64) -> Result<Vec<Sample>, StorageError> {
        let limit = limit.max(0);
        if limit == 0 {
            return Ok(Vec::new());
        }
        let sql = format!(
            "select {SAMPLE_COLUMNS} \
             from sensor_data \
             order by \"timestamp\" desc, id desc \
             limit $1"
        );
        let rows = sqlx::query(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        samples_from_rows(rows)
    }
}
