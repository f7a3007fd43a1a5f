//! HMAC-SHA256 webhook signatures.
//!
//! The sender signs the raw request body with the shared secret and sends
//! the hex digest, optionally prefixed with `sha256=`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use voxverify_types::Timestamp;

use crate::{WebhookError, WebhookEvent};

type HmacSha256 = Hmac<Sha256>;

const PREFIX: &str = "sha256=";

#[derive(Clone)]
pub struct WebhookVerifier {
    secret: Option<Vec<u8>>,
    max_age_secs: Option<u64>,
}

impl WebhookVerifier {
    /// With no secret every body is accepted unsigned.
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()).map(String::into_bytes),
            max_age_secs: None,
        }
    }

    /// Reject events whose timestamp is more than `secs` old.
    pub fn with_max_age(mut self, secs: u64) -> Self {
        self.max_age_secs = Some(secs);
        self
    }

    pub fn requires_signature(&self) -> bool {
        self.secret.is_some()
    }

    /// Hex signature of `body` under the configured secret.
    pub fn sign(&self, body: &[u8]) -> Option<String> {
        let secret = self.secret.as_ref()?;
        let mac = mac(secret, body).ok()?;
        Some(hex::encode(mac.finalize().into_bytes()))
    }

    /// Check `signature` against `body` in constant time.
    pub fn verify(&self, body: &[u8], signature: Option<&str>) -> Result<(), WebhookError> {
        let Some(secret) = &self.secret else {
            return Ok(());
        };
        let signature = signature
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| WebhookError::Unauthorized("missing signature".into()))?;
        let hex_digest = signature.strip_prefix(PREFIX).unwrap_or(signature);
        let expected = hex::decode(hex_digest)
            .map_err(|_| WebhookError::Unauthorized("signature is not hex".into()))?;
        mac(secret, body)?
            .verify_slice(&expected)
            .map_err(|_| WebhookError::Unauthorized("signature mismatch".into()))
    }

    /// Apply the replay window, if any, to `event` as of `now`.
    pub fn check_fresh(&self, event: &WebhookEvent, now: Timestamp) -> Result<(), WebhookError> {
        match self.max_age_secs {
            Some(max_age_secs) if event.timestamp.has_expired(max_age_secs, now) => {
                Err(WebhookError::Stale {
                    age_secs: event.timestamp.elapsed_since(now),
                    max_age_secs,
                })
            }
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("max_age_secs", &self.max_age_secs)
            .finish()
    }
}

fn mac(secret: &[u8], body: &[u8]) -> Result<HmacSha256, WebhookError> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| WebhookError::Unauthorized(format!("unusable secret: {e}")))?;
    mac.update(body);
    Ok(mac)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &[u8] = br#"{"event":"verification.completed","timestamp":1}"#;

    #[test]
    fn signed_body_verifies_with_and_without_prefix() {
        let verifier = WebhookVerifier::new(Some("whsec".into()));
        let sig = verifier.sign(BODY).unwrap();
        assert_eq!(sig.len(), 64);
        verifier.verify(BODY, Some(&sig)).unwrap();
        verifier.verify(BODY, Some(&format!("sha256={sig}"))).unwrap();
    }

    #[test]
    fn known_vector() {
        // RFC 4231 test case 2.
        let verifier = WebhookVerifier::new(Some("Jefe".into()));
        assert_eq!(
            verifier.sign(b"what do ya want for nothing?").unwrap(),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn tampered_missing_or_garbled_signatures_are_rejected() {
        let verifier = WebhookVerifier::new(Some("whsec".into()));
        let sig = verifier.sign(BODY).unwrap();

        for (body, signature) in [
            (&b"{}"[..], Some(sig.as_str())),
            (BODY, None),
            (BODY, Some("")),
            (BODY, Some("zz-not-hex")),
            (BODY, Some("00ff")),
        ] {
            assert!(matches!(
                verifier.verify(body, signature),
                Err(WebhookError::Unauthorized(_))
            ));
        }
    }

    #[test]
    fn no_secret_accepts_anything() {
        let verifier = WebhookVerifier::new(None);
        assert!(!verifier.requires_signature());
        assert!(verifier.sign(BODY).is_none());
        verifier.verify(BODY, None).unwrap();
        verifier.verify(BODY, Some("garbage")).unwrap();
    }

    #[test]
    fn replay_window() {
        let verifier = WebhookVerifier::new(None).with_max_age(300);
        let event = WebhookEvent::from_slice(br#"{"event":"x","timestamp":1000}"#).unwrap();

        verifier.check_fresh(&event, Timestamp::new(1299)).unwrap();
        assert!(matches!(
            verifier.check_fresh(&event, Timestamp::new(1300)),
            Err(WebhookError::Stale { age_secs: 300, max_age_secs: 300 })
        ));
        WebhookVerifier::new(None)
            .check_fresh(&event, Timestamp::new(u64::MAX))
            .unwrap();
    }
}
