//! Monotonic time and sleeping, behind a trait so tests can run the poll
//! loop on virtual time.

use std::future::Future;
use std::time::Duration;

pub trait Clock: Send + Sync {
    /// Monotonic time since an arbitrary, fixed origin.
    fn now(&self) -> Duration;

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Wall-clock time from the tokio runtime.
#[derive(Clone, Debug)]
pub struct TokioClock {
    origin: tokio::time::Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

/// A wall-clock budget measured on a [`Clock`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Deadline {
    started: Duration,
    budget: Duration,
}

impl Deadline {
    /// Start a budget now.
    pub fn start(clock: &impl Clock, budget: Duration) -> Self {
        Self {
            started: clock.now(),
            budget,
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn elapsed(&self, clock: &impl Clock) -> Duration {
        clock.now().saturating_sub(self.started)
    }

    /// Time left, or `None` once the budget is spent.
    pub fn remaining(&self, clock: &impl Clock) -> Option<Duration> {
        let left = self.budget.checked_sub(self.elapsed(clock))?;
        if left.is_zero() {
            None
        } else {
            Some(left)
        }
    }

    pub fn is_expired(&self, clock: &impl Clock) -> bool {
        self.remaining(clock).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct ManualClock(AtomicU64);

    impl Clock for ManualClock {
        fn now(&self) -> Duration {
            Duration::from_millis(self.0.load(Ordering::SeqCst))
        }

        fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
            self.0
                .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[test]
    fn deadline_counts_down_and_expires() {
        let clock = ManualClock(AtomicU64::new(500));
        let deadline = Deadline::start(&clock, Duration::from_millis(1000));
        assert_eq!(deadline.remaining(&clock), Some(Duration::from_millis(1000)));

        clock.0.store(1200, Ordering::SeqCst);
        assert_eq!(deadline.remaining(&clock), Some(Duration::from_millis(300)));
        assert_eq!(deadline.elapsed(&clock), Duration::from_millis(700));

        clock.0.store(1500, Ordering::SeqCst);
        assert!(deadline.is_expired(&clock));
        clock.0.store(9000, Ordering::SeqCst);
        assert!(deadline.remaining(&clock).is_none());
    }

    #[tokio::test]
    async fn tokio_clock_moves_forward() {
        let clock = TokioClock::new();
        let before = clock.now();
        clock.sleep(Duration::from_millis(5)).await;
        assert!(clock.now() >= before + Duration::from_millis(5));
    }
}
