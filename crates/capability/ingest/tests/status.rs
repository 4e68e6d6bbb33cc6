use iot_ingest::StatusRegister;
use std::thread::sleep;
use std::time::Duration;

#[test]
fn initial_status_is_disconnected_without_code() {
    let status = StatusRegister::new().snapshot();
    assert!(!status.connected);
    assert!(status.last_result_code.is_none());
    assert!(status.last_change_at_ms.is_none());
}

#[test]
fn disconnect_records_code_and_newer_timestamp() {
    let register = StatusRegister::new();
    register.mark_connected();
    let connected = register.snapshot();
    assert!(connected.connected);
    assert_eq!(connected.last_result_code, Some(0));

    sleep(Duration::from_millis(5));
    register.mark_disconnected(5);
    let disconnected = register.snapshot();
    assert!(!disconnected.connected);
    assert_eq!(disconnected.last_result_code, Some(5));
    assert!(disconnected.last_change_at_ms > connected.last_change_at_ms);
}

#[test]
fn refusal_keeps_disconnected() {
    let register = StatusRegister::new();
    register.record_refused(4);
    let status = register.snapshot();
    assert!(!status.connected);
    assert_eq!(status.last_result_code, Some(4));
}
