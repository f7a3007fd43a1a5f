//! Result/error normalization.
//!
//! Turns raw HTTP responses into typed wire bodies, wire status bodies into
//! [`SessionUpdate`]s, and anything unexpected into a [`VerifyError`].

use serde::de::DeserializeOwned;
use voxverify_types::{SessionStatus, SessionUpdate, VerificationDetails, VerificationResult};

use crate::http::HttpResponse;
use crate::wire::{ErrorBody, StatusResponse};
use crate::VerifyError;

/// Reason reported when the service fails a session without saying why.
pub const GENERIC_FAILURE_REASON: &str = "verification failed";

/// Decode a successful response body, or report it as malformed.
pub fn decode_body<T: DeserializeOwned>(
    response: &HttpResponse,
    what: &str,
) -> Result<T, VerifyError> {
    serde_json::from_slice(&response.body).map_err(|e| {
        VerifyError::api_with_source(
            Some(response.status),
            format!("malformed {what} response"),
            e,
        )
    })
}

/// Build the `Api` error for a non-retryable status, preferring the
/// service's own message when the body carries one.
pub fn api_error_from_response(response: &HttpResponse) -> VerifyError {
    let message = serde_json::from_slice::<ErrorBody>(&response.body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| {
            let text = response.text();
            if text.trim().is_empty() {
                format!("request rejected with HTTP {}", response.status)
            } else {
                truncate(&text, 200)
            }
        });
    VerifyError::api(Some(response.status), message)
}

/// Map a status body onto the session state machine.
///
/// A Completed status without a `verified` field is a protocol violation.
pub fn session_update(body: StatusResponse) -> Result<SessionUpdate, VerifyError> {
    match body.status {
        SessionStatus::Pending => Ok(SessionUpdate::Pending),
        SessionStatus::Failed => Ok(SessionUpdate::Failed {
            reason: body
                .error
                .or(body.reason)
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| GENERIC_FAILURE_REASON.to_string()),
        }),
        SessionStatus::Completed => {
            let verified = body
                .verified
                .ok_or_else(|| VerifyError::api(None, "session completed without result"))?;
            let confidence = body.confidence.unwrap_or(0.0);
            let mut result = VerificationResult::new(verified, confidence).map_err(|e| {
                VerifyError::api_with_source(None, "invalid verification result", e)
            })?;
            if let Some(d) = body.details {
                result = result.with_details(VerificationDetails {
                    phrase_accuracy: d.phrase_accuracy,
                    voice_match_score: d.voice_match_score,
                    fingerprint_valid: d.fingerprint_valid,
                    processing_time_ms: d.processing_time,
                });
            }
            if let Some(reason) = body.reason.or(body.error) {
                result = result.with_reason(reason);
            }
            Ok(SessionUpdate::Completed(result))
        }
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max_chars).collect();
    out.push('…');
    out
}
