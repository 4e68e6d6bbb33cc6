//! MQTT 订阅：会话、重连退避、连接状态登记。
//!
//! 订阅任务独占传输会话，收到的消息按到达顺序逐条交给 [`MessageHandler`]。

pub mod backoff;
pub mod status;
pub mod subscriber;
pub mod transport;

use async_trait::async_trait;

pub use backoff::Backoff;
pub use status::StatusRegister;
pub use subscriber::{
    Subscriber, SubscriberConfig, SubscriberHandle, SubscriberState, spawn_subscriber,
};
pub use transport::{
    MqttSettings, MqttTransport, TlsMaterial, Transport, TransportError, TransportEvent,
    load_tls_material,
};

/// 采集错误。
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("handler error: {0}")]
    Handler(String),
}

/// 上行消息处理器。
///
/// 返回错误只会被记录，不影响后续消息。
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, topic: &str, payload: &[u8]) -> Result<(), IngestError>;
}
