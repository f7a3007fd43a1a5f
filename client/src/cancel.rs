//! Cooperative cancellation for in-flight verification calls.
//!
//! A [`CancelHandle`] stays with whoever may abort the call; every
//! [`CancelToken`] cloned from it observes the cancellation. Once
//! cancelled, a token stays cancelled, so a late subscriber still sees it.

use std::future::Future;

use tokio::sync::watch;

use crate::VerifyError;

pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

#[derive(Clone, Debug)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }

    /// Cancel every token handed out by this handle.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    /// A token that is never cancelled.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancelled; pends forever if the handle is dropped
    /// without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        let handle_dropped = rx.wait_for(|cancelled| *cancelled).await.is_err();
        if handle_dropped {
            std::future::pending::<()>().await;
        }
    }

    /// Run `fut` unless cancellation arrives first.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, VerifyError> {
        if self.is_cancelled() {
            return Err(VerifyError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(VerifyError::Cancelled),
            out = fut => Ok(out),
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::never()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn cancel_notifies_existing_and_late_tokens() {
        let handle = CancelHandle::new();
        let early = handle.token();
        handle.cancel();
        let late = handle.token();

        assert!(early.is_cancelled());
        assert!(late.is_cancelled());
        tokio::time::timeout(Duration::from_secs(1), late.cancelled())
            .await
            .expect("late token resolves");
    }

    #[tokio::test]
    async fn never_token_does_not_resolve() {
        let token = CancelToken::never();
        assert!(!token.is_cancelled());
        let res = tokio::time::timeout(Duration::from_millis(20), token.cancelled()).await;
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn run_aborts_pending_work_on_cancel() {
        let handle = CancelHandle::new();
        let token = handle.token();
        let work = tokio::spawn(async move {
            token
                .run(tokio::time::sleep(Duration::from_secs(60)))
                .await
        });
        tokio::time::sleep(Duration::from_millis(5)).await;
        handle.cancel();
        let res = tokio::time::timeout(Duration::from_secs(1), work)
            .await
            .expect("aborted promptly")
            .expect("task joined");
        assert!(matches!(res, Err(VerifyError::Cancelled)));
    }

    #[tokio::test]
    async fn run_passes_output_through() {
        let out = CancelToken::never().run(async { 7 }).await.unwrap();
        assert_eq!(out, 7);
    }

    #[tokio::test]
    async fn cancel_wakes_a_waiting_task() {
        let handle = CancelHandle::new();
        let token = handle.token();
        let waiter = tokio::spawn(async move { token.cancelled().await });
        tokio::time::sleep(Duration::from_millis(5)).await;
        handle.cancel();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter woke")
            .expect("task joined");
    }
}
