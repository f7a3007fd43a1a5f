//! Session initiation: `POST /verify`.

use voxverify_types::{ProgressStage, SessionId, SessionStatus, Timestamp, VerificationSession};

use crate::clock::{Clock, Deadline};
use crate::http::HttpBackend;
use crate::normalize::GENERIC_FAILURE_REASON;
use crate::options::VerificationOptions;
use crate::progress::ProgressTracker;
use crate::transport::{RequestPolicy, Transport};
use crate::wire::{CreateSessionRequest, CreateSessionResponse};
use crate::VerifyError;

pub const VERIFY_PATH: &str = "/verify";

/// `/verify/{id}/status`, with the opaque id percent-encoded.
pub fn status_path(id: &SessionId) -> String {
    format!("{VERIFY_PATH}/{}/status", encode_segment(id.as_str()))
}

fn encode_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

pub struct SessionInitiator<'a, B, C> {
    transport: &'a Transport<B, C>,
}

impl<'a, B: HttpBackend, C: Clock> SessionInitiator<'a, B, C> {
    pub fn new(transport: &'a Transport<B, C>) -> Self {
        Self { transport }
    }

    /// Create a session for `options`.
    ///
    /// Reports `starting` before validation and `calling` once the service
    /// has accepted the session. Options are validated before any request
    /// is made.
    pub async fn open(
        &self,
        options: &VerificationOptions,
        deadline: Option<Deadline>,
        tracker: &mut ProgressTracker,
    ) -> Result<VerificationSession, VerifyError> {
        let clock = self.transport.clock();
        tracker.advance(ProgressStage::Starting, clock.now());
        options.validate()?;

        let body = CreateSessionRequest::new(
            options.identity(),
            options.customer_data(),
            options.risk_level(),
        );
        let policy = RequestPolicy {
            retries: options.retries(),
            deadline,
            cancel: options.cancel_token().clone(),
            headers: Vec::new(),
        };

        let response: CreateSessionResponse = self
            .transport
            .post_json(VERIFY_PATH, &body, "create session", &policy)
            .await?;

        let raw_id = response
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| VerifyError::api(Some(200), "create session response has no id"))?;
        let id = SessionId::new(raw_id)
            .map_err(|e| VerifyError::api_with_source(Some(200), "invalid session id", e))?;

        if response.status == Some(SessionStatus::Failed) {
            return Err(VerifyError::VerificationFailed {
                reason: response
                    .error
                    .unwrap_or_else(|| GENERIC_FAILURE_REASON.to_string()),
            });
        }

        self.transport.metrics().sessions_started.inc();
        tracing::info!(session = %id, "verification session created");

        tracker.set_session(id.clone());
        tracker.advance(ProgressStage::Calling, clock.now());
        Ok(VerificationSession::pending(id, Timestamp::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_path_encodes_opaque_ids() {
        let plain = SessionId::new("sess_abc-123").unwrap();
        assert_eq!(status_path(&plain), "/verify/sess_abc-123/status");

        let odd = SessionId::new("a/b c").unwrap();
        assert_eq!(status_path(&odd), "/verify/a%2Fb%20c/status");
    }
}
