//! 采集链路装配模块
//!
//! 把 MQTT 订阅、报文解码与持久化串成一条链路：
//! 每条上行消息解码为一组样本，作为一个事务写入 `sensor_data`。

use async_trait::async_trait;
use domain::now_epoch_ms;
use iot_config::AppConfig;
use iot_ingest::{
    IngestError, MessageHandler, MqttSettings, MqttTransport, StatusRegister, SubscriberConfig,
    SubscriberHandle, spawn_subscriber,
};
use iot_normalize::{Decoded, UnknownDevice, decode_samples};
use iot_pipeline::{PersistenceSink, StorageSampleWriter};
use iot_storage::SampleStore;
use iot_telemetry::{
    record_batch_committed, record_dropped_unknown_device, record_message_ignored,
    record_message_malformed, record_message_received, record_samples_decoded,
    record_samples_written, record_write_failure, record_write_latency_ms,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 上行消息处理器：解码 → 持久化。
struct UplinkHandler {
    sink: PersistenceSink,
    unknown_device: UnknownDevice,
}

#[async_trait]
impl MessageHandler for UplinkHandler {
    async fn handle(&self, topic: &str, payload: &[u8]) -> Result<(), IngestError> {
        record_message_received();

        let samples = match decode_samples(topic, payload, now_epoch_ms(), self.unknown_device) {
            Ok(Decoded::Samples(samples)) => samples,
            Ok(Decoded::Reserved) => {
                record_message_ignored();
                debug!(target: "iot.ingest", topic, "system_message_ignored");
                return Ok(());
            }
            Ok(Decoded::DeviceMissing) => {
                record_dropped_unknown_device();
                warn!(target: "iot.ingest", topic, "uplink_device_missing");
                return Ok(());
            }
            // 解码失败只影响当前消息
            Err(err) => {
                record_message_malformed();
                warn!(
                    target: "iot.ingest",
                    topic,
                    payload_size = payload.len(),
                    error = %err,
                    "uplink_malformed"
                );
                return Ok(());
            }
        };
        let drafts: Vec<_> = samples.collect();
        record_samples_decoded(drafts.len() as u64);
        info!(
            target: "iot.ingest",
            topic,
            samples = drafts.len(),
            "uplink_received"
        );

        match self.sink.persist(drafts).await {
            Ok(result) => {
                if result.written() > 0 {
                    record_batch_committed();
                    record_samples_written(result.written() as u64);
                    record_write_latency_ms(result.latency_ms);
                    info!(
                        target: "iot.ingest",
                        topic,
                        written = result.written(),
                        latency_ms = result.latency_ms,
                        "samples_persisted"
                    );
                }
                Ok(())
            }
            // 由订阅循环统一记录日志
            Err(err) => {
                record_write_failure();
                Err(IngestError::Handler(err.to_string()))
            }
        }
    }
}

fn build_handler(store: Arc<dyn SampleStore>, store_unknown_device: bool) -> UplinkHandler {
    let writer = StorageSampleWriter::new(store);
    let unknown_device = if store_unknown_device {
        UnknownDevice::StoreAsEmpty
    } else {
        UnknownDevice::Drop
    };
    UplinkHandler {
        sink: PersistenceSink::new(Arc::new(writer)),
        unknown_device,
    }
}

/// 启动采集任务；`INGEST_ENABLED=false` 时返回 `None`。
pub fn spawn_ingest(
    config: &AppConfig,
    store: Arc<dyn SampleStore>,
    status: Arc<StatusRegister>,
) -> Option<SubscriberHandle> {
    if !config.ingest_enabled {
        info!(target: "iot.ingest", "ingest_disabled");
        return None;
    }

    let client_id = config
        .mqtt_client_id
        .clone()
        .unwrap_or_else(|| format!("iot-ingest-{}", uuid::Uuid::new_v4()));
    let settings = MqttSettings {
        broker: config.mqtt_broker.clone(),
        port: config.mqtt_port,
        client_id,
        keepalive_secs: config.mqtt_keepalive_secs,
        max_packet_bytes: config.mqtt_max_packet_bytes,
        username: config.mqtt_username.clone(),
        password: config.mqtt_password.clone(),
        ca_path: config.mqtt_ca_path.clone(),
        cert_path: config.mqtt_cert_path.clone(),
        key_path: config.mqtt_key_path.clone(),
    };
    let transport = MqttTransport::new(&settings);

    let system_topic = Some(config.mqtt_system_topic.trim())
        .filter(|topic| !topic.is_empty())
        .map(str::to_string);
    let subscriber_config = SubscriberConfig {
        uplink_topic: config.mqtt_topic.clone(),
        system_topic,
        qos: config.mqtt_qos,
        reconnect_initial: Duration::from_millis(config.mqtt_reconnect_initial_ms),
        reconnect_max: Duration::from_millis(config.mqtt_reconnect_max_ms),
    };
    let handler = Arc::new(build_handler(store, config.ingest_store_unknown_device));

    info!(
        target: "iot.ingest",
        broker = %settings.broker,
        port = settings.port,
        client_id = %settings.client_id,
        topic = %subscriber_config.uplink_topic,
        "ingest_starting"
    );
    Some(spawn_subscriber(transport, subscriber_config, handler, status))
}
