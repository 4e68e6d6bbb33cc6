use domain::{SampleDraft, TimeBucket, TimeRange, TimestampSource};
use iot_storage::{InMemorySampleStore, SampleStore};

const HOUR_MS: i64 = 3_600_000;
// 2024-05-01T00:00:00Z
const BASE_MS: i64 = 1_714_521_600_000;

fn draft(device_id: &str, key: &str, value: f64, ts_ms: i64) -> SampleDraft {
    SampleDraft {
        device_id: device_id.to_string(),
        key: key.to_string(),
        value,
        ts_ms,
        ts_source: TimestampSource::Device,
    }
}

fn full_range() -> TimeRange {
    TimeRange::new(0, i64::MAX)
}

#[tokio::test]
async fn append_assigns_increasing_ids() {
    let store = InMemorySampleStore::new();
    let persisted = store
        .append_batch(vec![
            draft("dev-1", "temp", 20.0, BASE_MS),
            draft("dev-1", "hum", 40.0, BASE_MS),
        ])
        .await
        .expect("append");
    assert_eq!(persisted.len(), 2);
    assert!(persisted[0].id < persisted[1].id);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn invalid_draft_rolls_back_whole_batch() {
    let store = InMemorySampleStore::new();
    let err = store
        .append_batch(vec![
            draft("dev-1", "temp", 20.0, BASE_MS),
            draft("dev-1", "", 1.0, BASE_MS),
        ])
        .await
        .expect_err("rejected");
    assert!(err.is_validation());
    assert!(store.is_empty());

    let err = store
        .append_batch(vec![draft("dev-1", "temp", f64::NAN, BASE_MS)])
        .await
        .expect_err("rejected");
    assert!(err.is_validation());
    assert!(store.is_empty());
}

#[tokio::test]
async fn list_by_device_filters_range_inclusive() {
    let store = InMemorySampleStore::new();
    store
        .append_batch(vec![
            draft("dev-1", "temp", 3.0, BASE_MS + 3000),
            draft("dev-1", "temp", 1.0, BASE_MS + 1000),
            draft("dev-1", "temp", 2.0, BASE_MS + 2000),
            draft("dev-2", "temp", 9.0, BASE_MS + 2000),
        ])
        .await
        .expect("append");

    let items = store
        .list_by_device("dev-1", TimeRange::new(BASE_MS + 1000, BASE_MS + 2000))
        .await
        .expect("list");
    let values: Vec<f64> = items.iter().map(|item| item.value).collect();
    assert_eq!(values, vec![1.0, 2.0]);
}

#[tokio::test]
async fn latest_per_key_prefers_highest_id_on_tie() {
    let store = InMemorySampleStore::new();
    store
        .append_batch(vec![
            draft("dev-1", "temp", 1.0, BASE_MS),
            draft("dev-1", "temp", 2.0, BASE_MS + 1000),
            draft("dev-1", "hum", 50.0, BASE_MS + 500),
        ])
        .await
        .expect("append");
    store
        .append_batch(vec![draft("dev-1", "temp", 3.0, BASE_MS + 1000)])
        .await
        .expect("append");

    let latest = store.latest_per_key("dev-1").await.expect("latest");
    assert_eq!(latest.len(), 2);
    assert_eq!(latest[0].key, "hum");
    assert_eq!(latest[1].key, "temp");
    assert_eq!(latest[1].value, 3.0);
}

#[tokio::test]
async fn timeseries_is_ascending_for_one_key() {
    let store = InMemorySampleStore::new();
    store
        .append_batch(vec![
            draft("dev-1", "temp", 2.0, BASE_MS + 2000),
            draft("dev-1", "hum", 9.0, BASE_MS + 1500),
            draft("dev-1", "temp", 1.0, BASE_MS + 1000),
        ])
        .await
        .expect("append");
    let items = store
        .timeseries("dev-1", "temp", full_range())
        .await
        .expect("timeseries");
    let stamps: Vec<i64> = items.iter().map(|item| item.ts_ms).collect();
    assert_eq!(stamps, vec![BASE_MS + 1000, BASE_MS + 2000]);
}

#[tokio::test]
async fn hourly_aggregation_groups_non_empty_buckets() {
    let store = InMemorySampleStore::new();
    store
        .append_batch(vec![
            draft("dev-1", "temp", 10.0, BASE_MS + 60_000),
            draft("dev-1", "temp", 20.0, BASE_MS + 120_000),
            draft("dev-1", "temp", 40.0, BASE_MS + 2 * HOUR_MS + 1),
            draft("dev-2", "temp", 5.0, BASE_MS + 60_000),
            draft("dev-1", "hum", 99.0, BASE_MS + 60_000),
        ])
        .await
        .expect("append");

    let rows = store
        .aggregate(
            &["dev-1".to_string(), "dev-2".to_string()],
            "temp",
            full_range(),
            TimeBucket::Hour,
        )
        .await
        .expect("aggregate");

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].device_id, "dev-1");
    assert_eq!(rows[0].bucket_ms, BASE_MS);
    assert!((rows[0].average - 15.0).abs() < 1e-9);
    assert_eq!(rows[0].minimum, 10.0);
    assert_eq!(rows[0].maximum, 20.0);
    assert_eq!(rows[0].count, 2);
    assert_eq!(rows[1].device_id, "dev-1");
    assert_eq!(rows[1].bucket_ms, BASE_MS + 2 * HOUR_MS);
    assert_eq!(rows[1].count, 1);
    assert_eq!(rows[2].device_id, "dev-2");
    assert_eq!(rows[2].average, 5.0);
}

#[tokio::test]
async fn weekly_buckets_start_on_monday() {
    let store = InMemorySampleStore::new();
    // 2024-05-01 是周三，所在周从 2024-04-29（周一）开始。
    store
        .append_batch(vec![draft("dev-1", "temp", 1.0, BASE_MS)])
        .await
        .expect("append");
    let rows = store
        .aggregate(&["dev-1".to_string()], "temp", full_range(), TimeBucket::Week)
        .await
        .expect("aggregate");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].bucket_ms, BASE_MS - 2 * 24 * HOUR_MS);
}

#[tokio::test]
async fn recent_returns_newest_first_with_limit() {
    let store = InMemorySampleStore::new();
    store
        .append_batch(vec![
            draft("dev-1", "temp", 1.0, BASE_MS + 1000),
            draft("dev-1", "temp", 3.0, BASE_MS + 3000),
            draft("dev-2", "temp", 2.0, BASE_MS + 2000),
        ])
        .await
        .expect("append");
    let items = store.recent(2).await.expect("recent");
    let values: Vec<f64> = items.iter().map(|item| item.value).collect();
    assert_eq!(values, vec![3.0, 2.0]);
    assert!(store.recent(0).await.expect("recent").is_empty());
}

#[tokio::test]
async fn replayed_batch_inserts_duplicates() {
    let store = InMemorySampleStore::new();
    let batch = vec![draft("dev-1", "temp", 1.0, BASE_MS)];
    store.append_batch(batch.clone()).await.expect("append");
    store.append_batch(batch).await.expect("append");
    let items = store
        .list_by_device("dev-1", full_range())
        .await
        .expect("list");
    assert_eq!(items.len(), 2);
    assert_ne!(items[0].id, items[1].id);
}
