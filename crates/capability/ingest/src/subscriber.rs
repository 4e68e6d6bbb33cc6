//! 订阅循环：连接 → 订阅 → 逐条分发 →（失败）退避重连，直到收到停止信号。

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::MessageHandler;
use crate::backoff::Backoff;
use crate::status::{CODE_VOLUNTARY, StatusRegister};
use crate::transport::{Transport, TransportError, TransportEvent};

/// 订阅任务对外可见的状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberState {
    Disconnected,
    Connecting,
    Connected,
    Stopped,
}

/// 订阅参数。
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    pub uplink_topic: String,
    pub system_topic: Option<String>,
    pub qos: u8,
    pub reconnect_initial: Duration,
    pub reconnect_max: Duration,
}

/// 订阅循环。
pub struct Subscriber<T: Transport> {
    transport: T,
    config: SubscriberConfig,
    handler: Arc<dyn MessageHandler>,
    status: Arc<StatusRegister>,
    state: watch::Sender<SubscriberState>,
    backoff: Backoff,
}

impl<T: Transport> Subscriber<T> {
    pub fn new(
        transport: T,
        config: SubscriberConfig,
        handler: Arc<dyn MessageHandler>,
        status: Arc<StatusRegister>,
    ) -> (Self, watch::Receiver<SubscriberState>) {
        let (state, state_rx) = watch::channel(SubscriberState::Disconnected);
        let backoff = Backoff::new(config.reconnect_initial, config.reconnect_max);
        (
            Self {
                transport,
                config,
                handler,
                status,
                state,
                backoff,
            },
            state_rx,
        )
    }

    /// 运行到 `stop` 变为 true（或发送端被丢弃）。
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) {
        let mut connected = false;
        loop {
            if *stop.borrow() {
                break;
            }
            if !connected {
                self.set_state(SubscriberState::Connecting);
            }
            tokio::select! {
                _ = stop.changed() => break,
                event = self.transport.next_event() => match event {
                    Ok(TransportEvent::Connected) => {
                        connected = true;
                        self.on_connected().await;
                    }
                    Ok(TransportEvent::Message { topic, payload }) => {
                        Self::dispatch(self.handler.clone(), &topic, &payload).await;
                    }
                    Ok(TransportEvent::Disconnected { code }) => {
                        if connected {
                            iot_telemetry::record_disconnect();
                        }
                        connected = false;
                        self.status.mark_disconnected(code);
                        self.set_state(SubscriberState::Disconnected);
                        warn!(target: "iot.ingest", code, "mqtt_disconnected");
                    }
                    Ok(TransportEvent::Idle) => {}
                    Err(err) => {
                        self.on_error(connected, &err);
                        connected = false;
                        let delay = self.backoff.next_delay();
                        warn!(
                            target: "iot.ingest",
                            error = %err,
                            delay_ms = delay.as_millis() as u64,
                            "mqtt_reconnect_scheduled"
                        );
                        tokio::select! {
                            _ = stop.changed() => break,
                            _ = tokio::time::sleep(delay) => {}
                        }
                    }
                },
            }
        }

        if let Err(err) = self.transport.disconnect().await {
            debug!(target: "iot.ingest", error = %err, "mqtt_disconnect_failed");
        }
        self.status.mark_disconnected(CODE_VOLUNTARY);
        self.set_state(SubscriberState::Stopped);
        info!(target: "iot.ingest", "mqtt_subscriber_stopped");
    }

    async fn on_connected(&mut self) {
        self.backoff.reset();
        self.status.mark_connected();
        iot_telemetry::record_connect();
        info!(target: "iot.ingest", "mqtt_connected");

        let mut topics = vec![self.config.uplink_topic.clone()];
        if let Some(system_topic) = self.config.system_topic.clone() {
            topics.push(system_topic);
        }
        for topic in topics {
            match self.transport.subscribe(&topic, self.config.qos).await {
                Ok(()) => info!(target: "iot.ingest", topic = %topic, "mqtt_subscribed"),
                Err(err) => {
                    warn!(target: "iot.ingest", topic = %topic, error = %err, "mqtt_subscribe_failed")
                }
            }
        }
        self.set_state(SubscriberState::Connected);
    }

    /// 处理器失败只记录一次，不中断会话。
    async fn dispatch(handler: Arc<dyn MessageHandler>, topic: &str, payload: &[u8]) {
        if let Err(err) = handler.handle(topic, payload).await {
            warn!(target: "iot.ingest", topic, error = %err, "message_handler_failed");
        }
    }

    fn on_error(&self, connected: bool, err: &TransportError) {
        if connected {
            iot_telemetry::record_disconnect();
            self.status.mark_disconnected(err.result_code());
        } else {
            iot_telemetry::record_connect_failure();
            if let TransportError::Refused { code } = err {
                self.status.record_refused(*code);
            }
        }
        self.set_state(SubscriberState::Disconnected);
    }

    fn set_state(&self, state: SubscriberState) {
        self.state.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }
}

/// 运行中的订阅任务。
pub struct SubscriberHandle {
    stop: watch::Sender<bool>,
    state: watch::Receiver<SubscriberState>,
    join: JoinHandle<()>,
}

impl SubscriberHandle {
    pub fn state(&self) -> watch::Receiver<SubscriberState> {
        self.state.clone()
    }

    /// 发送停止信号并等待任务退出。
    pub async fn shutdown(self) {
        let _ = self.stop.send(true);
        if let Err(err) = self.join.await {
            warn!(target: "iot.ingest", error = %err, "mqtt_subscriber_join_failed");
        }
    }
}

/// 在独立任务上启动订阅循环。
pub fn spawn_subscriber<T>(
    transport: T,
    config: SubscriberConfig,
    handler: Arc<dyn MessageHandler>,
    status: Arc<StatusRegister>,
) -> SubscriberHandle
where
    T: Transport + 'static,
{
    let (stop, stop_rx) = watch::channel(false);
    let (subscriber, state) = Subscriber::new(transport, config, handler, status);
    let join = tokio::spawn(subscriber.run(stop_rx));
    SubscriberHandle { stop, state, join }
}
