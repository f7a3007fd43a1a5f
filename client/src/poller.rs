//! Completion polling.
//!
//! Queries `GET /verify/{id}/status` until the session reaches a terminal
//! state, the attempt budget runs out, or the deadline passes. The loop
//! always terminates: every iteration consumes one attempt.
//!
//! Each poll is a single HTTP attempt; the loop itself absorbs isolated
//! network failures (one attempt each) instead of stacking transport
//! retries on top of poll retries. Authoritative answers (`Api`,
//! `VerificationFailed`) end the loop immediately.

use voxverify_types::{SessionId, SessionUpdate, Timestamp, VerificationResult, VerificationSession};

use crate::backoff::Backoff;
use crate::cancel::CancelToken;
use crate::clock::{Clock, Deadline};
use crate::http::HttpBackend;
use crate::initiator::status_path;
use crate::normalize::session_update;
use crate::transport::{RequestPolicy, Transport};
use crate::wire::StatusResponse;
use crate::VerifyError;

/// How long and how often to poll.
#[derive(Clone, Copy, Debug)]
pub struct PollBudget {
    pub deadline: Deadline,
    pub max_attempts: u32,
}

pub struct CompletionPoller<'a, B, C> {
    transport: &'a Transport<B, C>,
    backoff: Backoff,
}

impl<'a, B: HttpBackend, C: Clock> CompletionPoller<'a, B, C> {
    pub fn new(transport: &'a Transport<B, C>) -> Self {
        Self {
            transport,
            backoff: Backoff::poll(transport.config()),
        }
    }

    /// Fetch and normalize the current status once.
    pub async fn fetch(
        &self,
        id: &SessionId,
        policy: &RequestPolicy,
    ) -> Result<SessionUpdate, VerifyError> {
        self.transport.metrics().polls.inc();
        let body: StatusResponse = self
            .transport
            .get_json(&status_path(id), "session status", policy)
            .await?;
        session_update(body)
    }

    /// Poll until `session` is terminal, updating the local copy as it goes.
    pub async fn poll(
        &self,
        session: &mut VerificationSession,
        budget: PollBudget,
        cancel: &CancelToken,
    ) -> Result<VerificationResult, VerifyError> {
        let clock = self.transport.clock();
        let policy = RequestPolicy::new()
            .retries(0)
            .deadline(budget.deadline)
            .cancel(cancel.clone());
        let mut attempts: u32 = 0;

        while attempts < budget.max_attempts && !budget.deadline.is_expired(clock) {
            let observed = self.fetch(session.id(), &policy).await;
            attempts += 1;

            match observed {
                Ok(update) => {
                    session.apply(update.clone(), Timestamp::now()).map_err(|e| {
                        VerifyError::api_with_source(None, "session state regressed", e)
                    })?;
                    match update {
                        SessionUpdate::Completed(result) => {
                            tracing::debug!(attempts, "session completed");
                            return Ok(result);
                        }
                        SessionUpdate::Failed { reason } => {
                            tracing::debug!(attempts, %reason, "session failed");
                            return Err(VerifyError::VerificationFailed { reason });
                        }
                        SessionUpdate::Pending => {}
                    }
                }
                Err(VerifyError::Timeout { .. }) => break,
                Err(e) if e.is_transient() && attempts < budget.max_attempts => {
                    tracing::warn!(attempts, "status poll failed, will retry: {e}");
                }
                Err(e) => return Err(e),
            }

            if attempts >= budget.max_attempts {
                break;
            }
            let delay = self.backoff.delay(attempts - 1);
            match self.transport.sleep_within(delay, &policy, attempts).await {
                Ok(()) => {}
                Err(VerifyError::Timeout { .. }) => break,
                Err(e) => return Err(e),
            }
        }

        let elapsed = budget.deadline.elapsed(clock);
        tracing::info!(attempts, ?elapsed, "session still pending; giving up");
        Err(VerifyError::Timeout { attempts, elapsed })
    }
}
