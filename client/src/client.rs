//! The public client.

use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;
use voxverify_types::{
    ProgressStage, SessionId, Timestamp, VerificationResult, VerificationSession,
};

use crate::cancel::CancelToken;
use crate::clock::{Clock, Deadline, TokioClock};
use crate::http::{HttpBackend, ReqwestBackend};
use crate::initiator::SessionInitiator;
use crate::metrics::ClientMetrics;
use crate::options::VerificationOptions;
use crate::poller::{CompletionPoller, PollBudget};
use crate::progress::ProgressTracker;
use crate::spans;
use crate::transport::{RequestPolicy, Transport};
use crate::{ClientConfig, VerifyError};

/// Voice verification client.
///
/// Cheap to clone; clones share the connection pool, the clock and the
/// metrics registry. Concurrent [`verify`](Self::verify) calls are
/// independent of each other.
pub struct VerificationClient<B = ReqwestBackend, C = TokioClock> {
    transport: Arc<Transport<B, C>>,
}

impl<B, C> Clone for VerificationClient<B, C> {
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
        }
    }
}

impl VerificationClient {
    /// Client over HTTP with the tokio clock.
    pub fn new(config: ClientConfig) -> Result<Self, VerifyError> {
        let backend = ReqwestBackend::new(&config).map_err(|e| {
            VerifyError::InvalidConfig(format!("failed to build HTTP client: {e}"))
        })?;
        Ok(Self::with_parts(config, backend, TokioClock::new()))
    }
}

impl<B: HttpBackend, C: Clock> VerificationClient<B, C> {
    pub fn with_parts(config: ClientConfig, backend: B, clock: C) -> Self {
        let transport = Transport::new(
            Arc::new(config),
            backend,
            clock,
            Arc::new(ClientMetrics::new()),
        );
        Self {
            transport: Arc::new(transport),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        self.transport.config()
    }

    pub fn metrics(&self) -> &ClientMetrics {
        self.transport.metrics()
    }

    /// Create a session without waiting for it. Progress events go to the
    /// notifier in `options`.
    pub async fn start_session(
        &self,
        options: &VerificationOptions,
    ) -> Result<VerificationSession, VerifyError> {
        let clock = self.transport.clock();
        let timeout = options.timeout().unwrap_or(self.config().timeout());
        let deadline = Deadline::start(clock, timeout);
        let mut tracker = ProgressTracker::new(options.progress().clone(), clock.now());
        let opened = SessionInitiator::new(&self.transport)
            .open(options, Some(deadline), &mut tracker)
            .await;
        if opened.is_err() {
            tracker.advance(ProgressStage::Failed, clock.now());
        }
        opened
    }

    /// Fetch a snapshot of a session's current state.
    pub async fn session_status(&self, id: &SessionId) -> Result<VerificationSession, VerifyError> {
        let update = CompletionPoller::new(&self.transport)
            .fetch(id, &RequestPolicy::new())
            .await?;
        let now = Timestamp::now();
        let mut session = VerificationSession::pending(id.clone(), now);
        session.apply(update, now)?;
        Ok(session)
    }

    /// Poll an existing session until it is terminal or the budget is spent.
    pub async fn wait_for_completion(
        &self,
        session: &mut VerificationSession,
        timeout: Duration,
        max_attempts: u32,
        cancel: &CancelToken,
    ) -> Result<VerificationResult, VerifyError> {
        if max_attempts == 0 {
            return Err(VerifyError::InvalidRequest(
                "max_attempts must be at least 1".into(),
            ));
        }
        let budget = PollBudget {
            deadline: Deadline::start(self.transport.clock(), timeout),
            max_attempts,
        };
        let span = spans::poll_span(session.id().as_str());
        CompletionPoller::new(&self.transport)
            .poll(session, budget, cancel)
            .instrument(span)
            .await
    }

    /// Run a complete verification: create a session, then poll it to a
    /// terminal state within the call's timeout.
    ///
    /// Progress is reported as `starting`, `calling`, `processing` and then
    /// exactly one of `completed` or `failed`. A result with
    /// `verified == false` is a successful call.
    pub async fn verify(
        &self,
        options: VerificationOptions,
    ) -> Result<VerificationResult, VerifyError> {
        let span = spans::verify_span(options.identity().kind(), options.risk_level());
        self.run(&options).instrument(span).await
    }

    async fn run(&self, options: &VerificationOptions) -> Result<VerificationResult, VerifyError> {
        let clock = self.transport.clock();
        let started = clock.now();
        let timeout = options.timeout().unwrap_or(self.config().timeout());
        let deadline = Deadline::start(clock, timeout);
        let mut tracker = ProgressTracker::new(options.progress().clone(), started);

        let outcome = self.drive(options, deadline, &mut tracker).await;

        let metrics = self.metrics();
        let elapsed = clock.now().saturating_sub(started);
        metrics
            .verification_duration_ms
            .observe(elapsed.as_secs_f64() * 1000.0);
        match &outcome {
            Ok(result) => {
                tracker.advance(ProgressStage::Completed, clock.now());
                metrics.record_success(result.verified());
                tracing::info!(
                    verified = result.verified(),
                    confidence = result.confidence(),
                    ?elapsed,
                    "verification finished"
                );
            }
            Err(e) => {
                tracker.advance(ProgressStage::Failed, clock.now());
                metrics.record_failure(e.kind());
                tracing::warn!(kind = e.kind().as_str(), ?elapsed, "verification failed: {e}");
            }
        }
        outcome
    }

    async fn drive(
        &self,
        options: &VerificationOptions,
        deadline: Deadline,
        tracker: &mut ProgressTracker,
    ) -> Result<VerificationResult, VerifyError> {
        let mut session = SessionInitiator::new(&self.transport)
            .open(options, Some(deadline), tracker)
            .await?;
        tracker.advance(ProgressStage::Processing, self.transport.clock().now());

        let budget = PollBudget {
            deadline,
            max_attempts: options
                .max_attempts()
                .unwrap_or(self.config().poll_max_attempts()),
        };
        let span = spans::poll_span(session.id().as_str());
        CompletionPoller::new(&self.transport)
            .poll(&mut session, budget, options.cancel_token())
            .instrument(span)
            .await
    }
}
