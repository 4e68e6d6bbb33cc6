use iot_telemetry::{
    IngestMetrics, metrics, record_batch_committed, record_connect, record_samples_written,
    record_write_latency_ms,
};

#[test]
fn fresh_metrics_start_at_zero() {
    let snapshot = IngestMetrics::new().snapshot();
    assert_eq!(snapshot.messages_received, 0);
    assert_eq!(snapshot.samples_written, 0);
    assert_eq!(snapshot.connects, 0);
}

#[test]
fn recorders_increase_global_counters() {
    let before = metrics().snapshot();
    record_samples_written(3);
    record_batch_committed();
    record_connect();
    record_write_latency_ms(12);
    let after = metrics().snapshot();
    assert!(after.samples_written >= before.samples_written + 3);
    assert!(after.batches_committed > before.batches_committed);
    assert!(after.connects > before.connects);
    assert!(after.write_latency_ms_total >= before.write_latency_ms_total + 12);
    assert!(after.write_latency_ms_count > before.write_latency_ms_count);
}
