//! 指数退避：第 k 次重试前等待 `min(initial * 2^(k-1), max)`。

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    current: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        let max = max.max(initial);
        Self {
            initial,
            max,
            current: initial,
        }
    }

    /// 返回本次等待时长，并把下一次翻倍（不超过上限）。
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = self.current.saturating_mul(2).min(self.max);
        delay
    }

    /// 连接成功后回到初始值。
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}
