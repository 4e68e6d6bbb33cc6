pub mod data;
pub mod time;

pub use data::{
    ConnectionStatus, Sample, SampleDraft, TimeBucket, TimeRange, TimestampSource,
};
pub use time::{format_timestamp_ms, now_epoch_ms, parse_epoch_number, parse_timestamp};
