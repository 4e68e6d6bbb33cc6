use domain::{TimeBucket, TimeRange, TimestampSource, parse_timestamp};

#[test]
fn bucket_parse_is_case_insensitive() {
    assert_eq!(TimeBucket::parse("hour"), Some(TimeBucket::Hour));
    assert_eq!(TimeBucket::parse(" Day "), Some(TimeBucket::Day));
    assert_eq!(TimeBucket::parse("WEEK"), Some(TimeBucket::Week));
    assert_eq!(TimeBucket::parse("month"), None);
}

#[test]
fn hour_and_day_buckets_floor() {
    let ts = parse_timestamp("2024-05-01T12:34:56Z").expect("ts");
    let hour = parse_timestamp("2024-05-01T12:00:00Z").expect("hour");
    let day = parse_timestamp("2024-05-01T00:00:00Z").expect("day");
    assert_eq!(TimeBucket::Hour.bucket_start(ts), hour);
    assert_eq!(TimeBucket::Day.bucket_start(ts), day);
}

#[test]
fn week_bucket_starts_on_monday() {
    // 2024-05-01 是周三，所在周从 2024-04-29（周一）开始。
    let ts = parse_timestamp("2024-05-01T12:34:56Z").expect("ts");
    let monday = parse_timestamp("2024-04-29T00:00:00Z").expect("monday");
    assert_eq!(TimeBucket::Week.bucket_start(ts), monday);
    assert_eq!(TimeBucket::Week.bucket_start(monday), monday);
}

#[test]
fn bucket_interval_literals() {
    assert_eq!(TimeBucket::Hour.interval(), "1 hour");
    assert_eq!(TimeBucket::Day.interval(), "1 day");
    assert_eq!(TimeBucket::Week.interval(), "1 week");
}

#[test]
fn range_is_inclusive() {
    let range = TimeRange::new(1000, 2000);
    assert!(range.contains(1000));
    assert!(range.contains(2000));
    assert!(!range.contains(2001));
}

#[test]
fn timestamp_source_round_trips_names() {
    assert_eq!(TimestampSource::parse("device"), Some(TimestampSource::Device));
    assert_eq!(TimestampSource::Receipt.as_str(), "receipt");
    assert_eq!(TimestampSource::parse("other"), None);
}
