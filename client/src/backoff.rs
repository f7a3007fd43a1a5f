//! Capped exponential backoff schedules.

use std::time::Duration;

use crate::ClientConfig;

/// `delay(n) = min(base × factor^n, cap)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Backoff {
    base: Duration,
    factor: f64,
    cap: Duration,
}

impl Backoff {
    pub fn new(base: Duration, factor: f64, cap: Duration) -> Self {
        Self {
            base,
            factor: factor.max(1.0),
            cap: cap.max(base),
        }
    }

    /// Transport retry schedule: doubles from `retry_delay`, capped at
    /// `retry_max_delay`.
    pub fn transport(config: &ClientConfig) -> Self {
        Self::new(config.retry_delay(), 2.0, config.retry_max_delay())
    }

    /// Inter-poll schedule: grows 1.5x from `poll_interval`, capped at
    /// `poll_max_interval`.
    pub fn poll(config: &ClientConfig) -> Self {
        Self::new(config.poll_interval(), 1.5, config.poll_max_interval())
    }

    /// Delay before the retry/poll following attempt number `attempt` (0-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let cap_ms = self.cap.as_millis() as f64;
        let exponent = attempt.min(i32::MAX as u32) as i32;
        let raw_ms = self.base.as_millis() as f64 * self.factor.powi(exponent);
        if !raw_ms.is_finite() || raw_ms >= cap_ms {
            return self.cap;
        }
        Duration::from_millis(raw_ms.round() as u64)
    }
}
