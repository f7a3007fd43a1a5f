//! Transport: one logical request against the service, with bounded retries.
//!
//! - 2xx is returned as-is.
//! - 4xx (and any other non-2xx, non-5xx status) fails at once with
//!   [`VerifyError::Api`]; a client error is not transient.
//! - 5xx and network-level failures are retried up to the retry budget,
//!   sleeping on the capped exponential [`Backoff::transport`] schedule,
//!   then surface as [`VerifyError::Network`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::backoff::Backoff;
use crate::cancel::CancelToken;
use crate::clock::{Clock, Deadline};
use crate::http::{BackendError, HttpBackend, HttpRequest, HttpResponse, Method};
use crate::metrics::ClientMetrics;
use crate::normalize::{api_error_from_response, decode_body};
use crate::{ClientConfig, VerifyError};

/// Per-call knobs layered over the client config.
#[derive(Clone, Debug, Default)]
pub struct RequestPolicy {
    /// Retry budget; `None` uses the configured default.
    pub retries: Option<u32>,
    /// Overall budget this request must fit in.
    pub deadline: Option<Deadline>,
    pub cancel: CancelToken,
    /// Extra headers; replace defaults of the same name.
    pub headers: Vec<(String, String)>,
}

impl RequestPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// The last thing that went wrong with a retryable attempt.
enum Failure {
    Status(HttpResponse),
    Backend(BackendError),
}

pub struct Transport<B, C> {
    config: Arc<ClientConfig>,
    backend: B,
    clock: C,
    metrics: Arc<ClientMetrics>,
    backoff: Backoff,
}

impl<B: HttpBackend, C: Clock> Transport<B, C> {
    pub fn new(
        config: Arc<ClientConfig>,
        backend: B,
        clock: C,
        metrics: Arc<ClientMetrics>,
    ) -> Self {
        let backoff = Backoff::transport(&config);
        Self {
            config,
            backend,
            clock,
            metrics,
            backoff,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn metrics(&self) -> &ClientMetrics {
        &self.metrics
    }

    /// `GET path` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        what: &str,
        policy: &RequestPolicy,
    ) -> Result<T, VerifyError> {
        let response = self.request(Method::Get, path, None, policy).await?;
        decode_body(&response, what)
    }

    /// `POST path` with a JSON body and decode the JSON response.
    pub async fn post_json<S: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &S,
        what: &str,
        policy: &RequestPolicy,
    ) -> Result<T, VerifyError> {
        let body = serde_json::to_vec(body).map_err(|e| {
            VerifyError::InvalidRequest(format!("failed to encode {what} request: {e}"))
        })?;
        let response = self.request(Method::Post, path, Some(body), policy).await?;
        decode_body(&response, what)
    }

    /// Issue one logical request, retrying transient failures.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        policy: &RequestPolicy,
    ) -> Result<HttpResponse, VerifyError> {
        let retries = policy.retries.unwrap_or(self.config.retries());
        let url = self.config.url(path);
        let headers = self.headers(&policy.headers);
        let mut last_status: Option<u16> = None;
        let mut attempt: u32 = 0;

        loop {
            let timeout = self.attempt_timeout(policy, attempt)?;
            let request = HttpRequest {
                method,
                url: url.clone(),
                headers: headers.clone(),
                body: body.clone(),
                timeout,
            };

            self.metrics.http_requests.inc();
            let failure = match policy.cancel.run(self.backend.execute(request)).await? {
                Ok(response) if response.is_success() => return Ok(response),
                Ok(response) if response.is_server_error() => {
                    last_status = Some(response.status);
                    Failure::Status(response)
                }
                Ok(response) => return Err(api_error_from_response(&response)),
                Err(e) => Failure::Backend(e),
            };

            if attempt >= retries {
                return Err(exhausted(method, path, attempt + 1, last_status, failure));
            }

            let delay = self.backoff.delay(attempt);
            match &failure {
                Failure::Status(r) => tracing::warn!(
                    %method, path, status = r.status, attempt = attempt + 1,
                    "server error, retrying in {delay:?}"
                ),
                Failure::Backend(e) => tracing::warn!(
                    %method, path, attempt = attempt + 1,
                    "request failed ({e}), retrying in {delay:?}"
                ),
            }
            self.sleep_within(delay, policy, attempt + 1).await?;
            attempt += 1;
            self.metrics.http_retries.inc();
        }
    }

    /// Sleep for `delay`, or fail with `Timeout` if the deadline ends first.
    pub async fn sleep_within(
        &self,
        delay: Duration,
        policy: &RequestPolicy,
        attempts: u32,
    ) -> Result<(), VerifyError> {
        let Some(deadline) = policy.deadline else {
            return policy.cancel.run(self.clock.sleep(delay)).await;
        };
        let remaining = deadline
            .remaining(&self.clock)
            .ok_or_else(|| self.timeout(&deadline, attempts))?;
        if delay >= remaining {
            policy.cancel.run(self.clock.sleep(remaining)).await?;
            return Err(self.timeout(&deadline, attempts));
        }
        policy.cancel.run(self.clock.sleep(delay)).await
    }

    /// Per-attempt timeout: the configured request timeout, shortened to
    /// whatever is left of the deadline.
    fn attempt_timeout(
        &self,
        policy: &RequestPolicy,
        attempts: u32,
    ) -> Result<Duration, VerifyError> {
        let request_timeout = self.config.request_timeout();
        match policy.deadline {
            None => Ok(request_timeout),
            Some(deadline) => deadline
                .remaining(&self.clock)
                .map(|left| left.min(request_timeout))
                .ok_or_else(|| self.timeout(&deadline, attempts)),
        }
    }

    fn timeout(&self, deadline: &Deadline, attempts: u32) -> VerifyError {
        VerifyError::Timeout {
            attempts,
            elapsed: deadline.elapsed(&self.clock),
        }
    }

    fn headers(&self, overrides: &[(String, String)]) -> Vec<(String, String)> {
        let mut headers: Vec<(String, String)> = vec![
            ("Content-Type".into(), "application/json".into()),
            ("Accept".into(), "application/json".into()),
            (
                "X-Client-Environment".into(),
                self.config.environment().as_str().into(),
            ),
        ];
        if let Some(key) = self.config.api_key() {
            headers.push(("Authorization".into(), format!("Bearer {key}")));
        }
        for (name, value) in overrides {
            headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
            headers.push((name.clone(), value.clone()));
        }
        headers
    }
}

fn exhausted(
    method: Method,
    path: &str,
    attempts: u32,
    last_status: Option<u16>,
    failure: Failure,
) -> VerifyError {
    match failure {
        Failure::Status(response) => VerifyError::Network {
            attempts,
            last_status,
            message: format!("{method} {path} returned HTTP {}", response.status),
            source: None,
        },
        Failure::Backend(e) => VerifyError::Network {
            attempts,
            last_status,
            message: format!("{method} {path} failed: {}", e.message),
            source: Some(e),
        },
    }
}
