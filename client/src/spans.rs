//! [`tracing::Span`] constructors for verification calls.

use tracing::{info_span, Span};
use voxverify_types::RiskLevel;

/// Span covering one full `verify` call.
pub fn verify_span(identity_kind: &str, risk_level: Option<RiskLevel>) -> Span {
    let risk = risk_level.map(|r| r.as_str()).unwrap_or("unspecified");
    info_span!("verify", identity = %identity_kind, risk = %risk)
}

/// Span covering the completion poll of one session.
pub fn poll_span(session_id: &str) -> Span {
    info_span!("poll", session = %session_id)
}
