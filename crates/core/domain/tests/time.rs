use domain::{format_timestamp_ms, parse_epoch_number, parse_timestamp};

#[test]
fn parses_rfc3339_with_fraction_and_offset() {
    assert_eq!(
        parse_timestamp("2024-05-01T12:34:56.789Z"),
        Some(1_714_566_896_789)
    );
    assert_eq!(
        parse_timestamp("2024-05-01T14:34:56+02:00"),
        Some(1_714_566_896_000)
    );
}

#[test]
fn parses_naive_datetime_as_utc() {
    assert_eq!(parse_timestamp("2024-05-01T12:34:56"), Some(1_714_566_896_000));
    assert_eq!(parse_timestamp("2024-05-01 12:34:56"), Some(1_714_566_896_000));
    assert_eq!(
        parse_timestamp("2024-05-01T12:34:56.500"),
        Some(1_714_566_896_500)
    );
}

#[test]
fn parses_date_only() {
    assert_eq!(parse_timestamp("2024-05-01"), Some(1_714_521_600_000));
}

#[test]
fn parses_epoch_digits() {
    assert_eq!(parse_timestamp("1714566896"), Some(1_714_566_896_000));
    assert_eq!(parse_timestamp("1714566896789"), Some(1_714_566_896_789));
    assert_eq!(parse_epoch_number(1_714_566_896.5), Some(1_714_566_896_500));
    assert_eq!(parse_epoch_number(f64::NAN), None);
    assert_eq!(parse_epoch_number(-1.0), None);
}

#[test]
fn rejects_garbage() {
    assert_eq!(parse_timestamp(""), None);
    assert_eq!(parse_timestamp("   "), None);
    assert_eq!(parse_timestamp("yesterday"), None);
}

#[test]
fn formats_utc() {
    assert_eq!(format_timestamp_ms(1_714_566_896_000), "2024-05-01T12:34:56Z");
    assert_eq!(
        format_timestamp_ms(1_714_566_896_789),
        "2024-05-01T12:34:56.789Z"
    );
}
