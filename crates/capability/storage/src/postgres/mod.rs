//! # PostgreSQL 存储实现模块
//!
//! 依赖 `sensor_data` 表（见 `schema.rs`）。TimescaleDB 启用时聚合使用
//! `time_bucket`，否则使用 `date_trunc`（按 UTC 截断）。
//!
//! 所有查询使用参数绑定；时间以毫秒进出，库内为 `timestamptz`。

pub mod sample;

pub use sample::*;
