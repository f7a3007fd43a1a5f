//! Progress notification.
//!
//! Each verification call reports an ordered sequence of
//! [`ProgressStage`]s. Delivery is best-effort and never blocks or fails
//! the call: a full or closed channel drops the event, and a panicking
//! callback is caught and logged.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use voxverify_types::{ProgressStage, SessionId};

/// One stage change of one verification call.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressEvent {
    pub stage: ProgressStage,
    /// Known from `Calling` onwards.
    pub session_id: Option<SessionId>,
    /// Time since the call started.
    pub elapsed: Duration,
}

type Callback = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;

#[derive(Clone)]
enum Sink {
    Disabled,
    Channel(mpsc::Sender<ProgressEvent>),
    Callback(Callback),
}

/// Where progress events go. Cheap to clone.
#[derive(Clone)]
pub struct ProgressNotifier {
    sink: Sink,
}

impl ProgressNotifier {
    /// A notifier that discards every event.
    pub fn disabled() -> Self {
        Self {
            sink: Sink::Disabled,
        }
    }

    /// A notifier backed by a bounded channel; the receiver gets the events.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                sink: Sink::Channel(tx),
            },
            rx,
        )
    }

    /// Adapt a plain callback. The callback runs synchronously on the
    /// verifying task, so it should return quickly.
    pub fn from_callback<F>(callback: F) -> Self
    where
        F: Fn(&ProgressEvent) + Send + Sync + 'static,
    {
        Self {
            sink: Sink::Callback(Arc::new(callback)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self.sink, Sink::Disabled)
    }

    /// Deliver one event. Never blocks, never panics.
    pub fn notify(&self, event: ProgressEvent) {
        match &self.sink {
            Sink::Disabled => {}
            Sink::Channel(tx) => match tx.try_send(event) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(event)) => {
                    tracing::debug!(stage = %event.stage, "progress channel full, dropping event");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            },
            Sink::Callback(callback) => {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| callback(&event)));
                if outcome.is_err() {
                    tracing::warn!(stage = %event.stage, "progress callback panicked; ignoring");
                }
            }
        }
    }
}

impl Default for ProgressNotifier {
    fn default() -> Self {
        Self::disabled()
    }
}

impl std::fmt::Debug for ProgressNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.sink {
            Sink::Disabled => "disabled",
            Sink::Channel(_) => "channel",
            Sink::Callback(_) => "callback",
        };
        f.debug_struct("ProgressNotifier").field("sink", &kind).finish()
    }
}

/// Per-call stage tracker.
///
/// Forwards only forward moves, so the observed sequence is strictly
/// increasing and contains at most one terminal stage.
#[derive(Debug)]
pub struct ProgressTracker {
    notifier: ProgressNotifier,
    last: Option<ProgressStage>,
    session_id: Option<SessionId>,
    started: Duration,
}

impl ProgressTracker {
    /// `started` is the call's start time on the client's clock.
    pub fn new(notifier: ProgressNotifier, started: Duration) -> Self {
        Self {
            notifier,
            last: None,
            session_id: None,
            started,
        }
    }

    pub fn set_session(&mut self, id: SessionId) {
        self.session_id = Some(id);
    }

    pub fn last_stage(&self) -> Option<ProgressStage> {
        self.last
    }

    /// Move to `stage` at clock time `now`. Returns whether it was emitted.
    pub fn advance(&mut self, stage: ProgressStage, now: Duration) -> bool {
        if let Some(last) = self.last {
            if last.is_terminal() || stage <= last {
                return false;
            }
        }
        self.last = Some(stage);
        tracing::debug!(stage = %stage, "verification progress");
        self.notifier.notify(ProgressEvent {
            stage,
            session_id: self.session_id.clone(),
            elapsed: now.saturating_sub(self.started),
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn recorder() -> (ProgressNotifier, Arc<Mutex<Vec<ProgressStage>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let notifier = ProgressNotifier::from_callback(move |e| sink.lock().unwrap().push(e.stage));
        (notifier, seen)
    }

    #[test]
    fn tracker_emits_forward_moves_only() {
        let (notifier, seen) = recorder();
        let mut tracker = ProgressTracker::new(notifier, Duration::ZERO);
        assert!(tracker.advance(ProgressStage::Starting, Duration::ZERO));
        assert!(tracker.advance(ProgressStage::Calling, Duration::from_millis(10)));
        assert!(!tracker.advance(ProgressStage::Starting, Duration::from_millis(11)));
        assert!(!tracker.advance(ProgressStage::Calling, Duration::from_millis(12)));
        assert!(tracker.advance(ProgressStage::Processing, Duration::from_millis(13)));
        assert!(tracker.advance(ProgressStage::Completed, Duration::from_millis(14)));
        assert!(!tracker.advance(ProgressStage::Failed, Duration::from_millis(15)));
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ProgressStage::Starting,
                ProgressStage::Calling,
                ProgressStage::Processing,
                ProgressStage::Completed
            ]
        );
    }

    #[test]
    fn failed_can_follow_any_non_terminal_stage() {
        let (notifier, seen) = recorder();
        let mut tracker = ProgressTracker::new(notifier, Duration::ZERO);
        tracker.advance(ProgressStage::Starting, Duration::ZERO);
        tracker.advance(ProgressStage::Failed, Duration::ZERO);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![ProgressStage::Starting, ProgressStage::Failed]
        );
    }

    #[test]
    fn panicking_callback_is_contained() {
        let notifier = ProgressNotifier::from_callback(|_| panic!("observer bug"));
        let mut tracker = ProgressTracker::new(notifier, Duration::ZERO);
        assert!(tracker.advance(ProgressStage::Starting, Duration::ZERO));
        assert!(tracker.advance(ProgressStage::Calling, Duration::ZERO));
    }

    #[test]
    fn full_channel_drops_instead_of_blocking() {
        let (notifier, mut rx) = ProgressNotifier::channel(1);
        let mut tracker = ProgressTracker::new(notifier, Duration::from_secs(1));
        tracker.set_session(SessionId::new("sess_7").unwrap());
        tracker.advance(ProgressStage::Starting, Duration::from_secs(3));
        tracker.advance(ProgressStage::Calling, Duration::from_secs(4));

        let first = rx.try_recv().unwrap();
        assert_eq!(first.stage, ProgressStage::Starting);
        assert_eq!(first.elapsed, Duration::from_secs(2));
        assert_eq!(first.session_id.unwrap().as_str(), "sess_7");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_channel_is_ignored() {
        let (notifier, rx) = ProgressNotifier::channel(4);
        drop(rx);
        notifier.notify(ProgressEvent {
            stage: ProgressStage::Starting,
            session_id: None,
            elapsed: Duration::ZERO,
        });
    }
}
