use iot_ingest::Backoff;
use std::time::Duration;

#[test]
fn delays_double_until_ceiling() {
    let mut backoff = Backoff::new(Duration::from_millis(100), Duration::from_millis(500));
    let delays: Vec<u128> = (0..5).map(|_| backoff.next_delay().as_millis()).collect();
    assert_eq!(delays, vec![100, 200, 400, 500, 500]);
}

#[test]
fn reset_returns_to_initial_delay() {
    let mut backoff = Backoff::new(Duration::from_secs(1), Duration::from_secs(60));
    backoff.next_delay();
    backoff.next_delay();
    backoff.reset();
    assert_eq!(backoff.next_delay(), Duration::from_secs(1));
}

#[test]
fn ceiling_below_initial_is_raised() {
    let mut backoff = Backoff::new(Duration::from_secs(2), Duration::from_secs(1));
    assert_eq!(backoff.next_delay(), Duration::from_secs(2));
    assert_eq!(backoff.next_delay(), Duration::from_secs(2));
}
