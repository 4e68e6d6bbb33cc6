//! 表结构引导
//!
//! 启动时幂等执行，不做迁移。

use crate::error::StorageError;
use sqlx::PgPool;

const CREATE_TABLE: &str = "create table if not exists sensor_data ( \
     id bigserial not null, \
     device_id text not null, \
     key text not null, \
     value double precision not null, \
     \"timestamp\" timestamptz not null, \
     timestamp_source text not null default 'device', \
     primary key (id, \"timestamp\") \
 )";

const CREATE_INDEX: &str = "create index if not exists idx_sensor_data_device_key_ts \
     on sensor_data (device_id, key, \"timestamp\" desc)";

/// 建表与索引；`timescale` 为 true 时同时启用扩展并转换为 hypertable。
pub async fn ensure_schema(pool: &PgPool, timescale: bool) -> Result<(), StorageError> {
    if timescale {
        sqlx::query("create extension if not exists timescaledb")
            .execute(pool)
            .await?;
    }
    sqlx::query(CREATE_TABLE).execute(pool).await?;
    if timescale {
        sqlx::query(
            "select create_hypertable('sensor_data', 'timestamp', \
             if_not_exists => true, migrate_data => true)",
        )
        .execute(pool)
        .await?;
    }
    sqlx::query(CREATE_INDEX).execute(pool).await?;
    tracing::info!(target: "iot.storage", timescale, "schema_ready");
    Ok(())
}
