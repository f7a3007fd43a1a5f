//! Nullable clock: virtual time for testing.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use voxverify_client::Clock;

#[derive(Debug, Default)]
struct State {
    now: Duration,
    sleeps: Vec<Duration>,
}

/// A deterministic clock for testing.
///
/// Time only advances when you tell it to, or when something sleeps on
/// it: `sleep` returns at once after moving the clock forward by the
/// requested duration. Clones share the same timeline.
#[derive(Clone, Debug, Default)]
pub struct NullClock {
    state: Arc<Mutex<State>>,
}

impl NullClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance time without recording a sleep.
    pub fn advance(&self, by: Duration) {
        self.lock().now += by;
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.lock().sleeps.clone()
    }

    pub fn total_slept(&self) -> Duration {
        self.lock().sleeps.iter().sum()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Clock for NullClock {
    fn now(&self) -> Duration {
        self.lock().now
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        {
            let mut state = self.lock();
            state.now += duration;
            state.sleeps.push(duration);
        }
        std::future::ready(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sleep_advances_virtual_time() {
        let clock = NullClock::new();
        clock.sleep(Duration::from_millis(1500)).await;
        clock.advance(Duration::from_millis(500));
        assert_eq!(clock.now(), Duration::from_secs(2));
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(1500)]);
    }

    #[test]
    fn clones_share_time() {
        let a = NullClock::new();
        let b = a.clone();
        a.advance(Duration::from_secs(3));
        assert_eq!(b.now(), Duration::from_secs(3));
    }
}
