//! 连接状态登记：订阅任务写，查询接口读。

use domain::{ConnectionStatus, now_epoch_ms};
use std::sync::{PoisonError, RwLock};

/// 连接意外丢失。
pub const CODE_CONNECTION_LOST: i32 = 7;
/// 主动断开。
pub const CODE_VOLUNTARY: i32 = 0;

/// 进程内唯一的连接状态，显式构造后以 `Arc` 共享。
#[derive(Debug, Default)]
pub struct StatusRegister {
    inner: RwLock<ConnectionStatus>,
}

impl StatusRegister {
    pub fn new() -> Self {
        Self::default()
    }

    /// 读取当前状态副本。
    pub fn snapshot(&self) -> ConnectionStatus {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn mark_connected(&self) {
        self.set(true, CODE_VOLUNTARY);
    }

    /// 断开（主动为 0，丢失为 7，其余为 broker 返回码）。
    pub fn mark_disconnected(&self, code: i32) {
        self.set(false, code);
    }

    /// 连接被 broker 拒绝。
    pub fn record_refused(&self, code: i32) {
        self.set(false, code);
    }

    fn set(&self, connected: bool, code: i32) {
        let mut status = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *status = ConnectionStatus {
            connected,
            last_result_code: Some(code),
            last_change_at_ms: Some(now_epoch_ms()),
        };
    }
}
