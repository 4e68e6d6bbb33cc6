//! 传输会话抽象与 rumqttc 实现。

use async_trait::async_trait;
use rumqttc::{
    AsyncClient, ConnectReturnCode, ConnectionError, Event, EventLoop, MqttOptions, Outgoing,
    Packet, QoS, TlsConfiguration,
};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::status::{CODE_CONNECTION_LOST, CODE_VOLUNTARY};

const DISCONNECT_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// 会话事件。
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// broker 接受连接。
    Connected,
    Message { topic: String, payload: Vec<u8> },
    Disconnected { code: i32 },
    /// 与订阅无关的协议事件（心跳、确认等）。
    Idle,
}

/// 传输错误。
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("connection refused with code {code}")]
    Refused { code: i32 },
    #[error("network error: {0}")]
    Network(String),
    #[error("request error: {0}")]
    Request(String),
}

impl TransportError {
    /// 写入状态登记的结果码。
    pub fn result_code(&self) -> i32 {
        match self {
            TransportError::Refused { code } => *code,
            _ => CODE_CONNECTION_LOST,
        }
    }
}

/// 传输会话抽象。
///
/// `next_event` 出错后再次调用即发起重连。
#[async_trait]
pub trait Transport: Send {
    async fn subscribe(&mut self, topic: &str, qos: u8) -> Result<(), TransportError>;

    async fn next_event(&mut self) -> Result<TransportEvent, TransportError>;

    async fn disconnect(&mut self) -> Result<(), TransportError>;
}

/// MQTT 连接参数。
#[derive(Debug, Clone)]
pub struct MqttSettings {
    pub broker: String,
    pub port: u16,
    pub client_id: String,
    /// `0` 表示关闭心跳。
    pub keepalive_secs: u64,
    /// 收发单个报文的字节上限。
    pub max_packet_bytes: usize,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ca_path: String,
    pub cert_path: String,
    pub key_path: String,
}

/// 从文件读取到的 TLS 材料。
#[derive(Debug, Clone, PartialEq)]
pub enum TlsMaterial {
    /// CA 不可读，退化为明文。
    Plain,
    /// 仅校验服务端。
    CaOnly { ca: Vec<u8> },
    Mutual {
        ca: Vec<u8>,
        cert: Vec<u8>,
        key: Vec<u8>,
    },
}

/// 读取 CA 与客户端证书；缺失时逐级降级并记录 warn。
pub fn load_tls_material(ca_path: &str, cert_path: &str, key_path: &str) -> TlsMaterial {
    let ca = match std::fs::read(Path::new(ca_path)) {
        Ok(ca) => ca,
        Err(err) => {
            warn!(target: "iot.ingest", ca_path, error = %err, "mqtt_tls_disabled");
            return TlsMaterial::Plain;
        }
    };
    match (
        std::fs::read(Path::new(cert_path)),
        std::fs::read(Path::new(key_path)),
    ) {
        (Ok(cert), Ok(key)) => TlsMaterial::Mutual { ca, cert, key },
        (cert, key) => {
            let error = cert.err().or(key.err()).map(|err| err.to_string());
            warn!(
                target: "iot.ingest",
                cert_path,
                key_path,
                error = error.as_deref().unwrap_or(""),
                "mqtt_client_cert_missing"
            );
            TlsMaterial::CaOnly { ca }
        }
    }
}

/// 基于 rumqttc 的会话（MQTT 3.1.1）。
pub struct MqttTransport {
    client: AsyncClient,
    eventloop: EventLoop,
}

impl MqttTransport {
    pub fn new(settings: &MqttSettings) -> Self {
        let mut options = MqttOptions::new(
            settings.client_id.clone(),
            settings.broker.clone(),
            settings.port,
        );
        options.set_keep_alive(Duration::from_secs(settings.keepalive_secs));
        // 超限报文会让事件循环报错并断开会话。
        options.set_max_packet_size(settings.max_packet_bytes, settings.max_packet_bytes);
        if let Some(username) = settings.username.as_ref() {
            let password = settings.password.clone().unwrap_or_default();
            options.set_credentials(username, password);
        }

        let tls = load_tls_material(&settings.ca_path, &settings.cert_path, &settings.key_path);
        let client_auth = match tls {
            TlsMaterial::Plain => None,
            TlsMaterial::CaOnly { ca } => Some((ca, None)),
            TlsMaterial::Mutual { ca, cert, key } => Some((ca, Some((cert, key)))),
        };
        if let Some((ca, client_auth)) = client_auth {
            options.set_transport(rumqttc::Transport::tls_with_config(
                TlsConfiguration::Simple {
                    ca,
                    alpn: None,
                    client_auth,
                },
            ));
        }

        info!(
            target: "iot.ingest",
            broker = %settings.broker,
            port = settings.port,
            client_id = %settings.client_id,
            "mqtt_transport_configured"
        );
        let (client, eventloop) = AsyncClient::new(options, 64);
        Self { client, eventloop }
    }
}

#[async_trait]
impl Transport for MqttTransport {
    async fn subscribe(&mut self, topic: &str, qos: u8) -> Result<(), TransportError> {
        self.client
            .subscribe(topic, qos_from_u8(qos))
            .await
            .map_err(|err| TransportError::Request(err.to_string()))
    }

    async fn next_event(&mut self) -> Result<TransportEvent, TransportError> {
        match self.eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => match ack.code {
                ConnectReturnCode::Success => Ok(TransportEvent::Connected),
                code => Err(TransportError::Refused {
                    code: return_code(code),
                }),
            },
            Ok(Event::Incoming(Packet::Publish(publish))) => Ok(TransportEvent::Message {
                topic: publish.topic,
                payload: publish.payload.to_vec(),
            }),
            Ok(Event::Incoming(Packet::Disconnect)) => Ok(TransportEvent::Disconnected {
                code: CODE_CONNECTION_LOST,
            }),
            Ok(Event::Outgoing(Outgoing::Disconnect)) => Ok(TransportEvent::Disconnected {
                code: CODE_VOLUNTARY,
            }),
            Ok(_) => Ok(TransportEvent::Idle),
            Err(ConnectionError::ConnectionRefused(code)) => Err(TransportError::Refused {
                code: return_code(code),
            }),
            Err(err) => Err(TransportError::Network(err.to_string())),
        }
    }

    async fn disconnect(&mut self) -> Result<(), TransportError> {
        self.client
            .disconnect()
            .await
            .map_err(|err| TransportError::Request(err.to_string()))?;
        // 断开请求需要事件循环发出。
        let eventloop = &mut self.eventloop;
        let flush = async move {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Outgoing(Outgoing::Disconnect)) | Err(_) => break,
                    Ok(_) => {}
                }
            }
        };
        let _ = tokio::time::timeout(DISCONNECT_FLUSH_TIMEOUT, flush).await;
        Ok(())
    }
}

fn qos_from_u8(qos: u8) -> QoS {
    match qos {
        1 => QoS::AtLeastOnce,
        2 => QoS::ExactlyOnce,
        _ => QoS::AtMostOnce,
    }
}

/// CONNACK 返回码（MQTT 3.1.1 数值）。
fn return_code(code: ConnectReturnCode) -> i32 {
    match code {
        ConnectReturnCode::Success => 0,
        ConnectReturnCode::RefusedProtocolVersion => 1,
        ConnectReturnCode::BadClientId => 2,
        ConnectReturnCode::ServiceUnavailable => 3,
        ConnectReturnCode::BadUserNamePassword => 4,
        ConnectReturnCode::NotAuthorized => 5,
    }
}
