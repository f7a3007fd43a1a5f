//! Verification results.

use serde::{Deserialize, Serialize};

use crate::TypesError;

/// Outcome of a completed verification session. Immutable once produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    verified: bool,
    confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<VerificationDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

/// Structured scoring details reported alongside a result.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationDetails {
    /// How closely the spoken answer matched the expected phrase, in [0, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phrase_accuracy: Option<f64>,
    /// Similarity against the enrolled voiceprint, in [0, 1].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_match_score: Option<f64>,
    /// Whether the device/call fingerprint checked out.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fingerprint_valid: Option<bool>,
    /// Server-side processing time in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<u64>,
}

impl VerificationResult {
    pub fn new(verified: bool, confidence: f64) -> Result<Self, TypesError> {
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(TypesError::ConfidenceOutOfRange(confidence));
        }
        Ok(Self {
            verified,
            confidence,
            details: None,
            reason: None,
        })
    }

    pub fn with_details(mut self, details: VerificationDetails) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn verified(&self) -> bool {
        self.verified
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn details(&self) -> Option<&VerificationDetails> {
        self.details.as_ref()
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_bounds_are_inclusive() {
        assert!(VerificationResult::new(true, 0.0).is_ok());
        assert!(VerificationResult::new(true, 1.0).is_ok());
        assert_eq!(
            VerificationResult::new(true, 1.01),
            Err(TypesError::ConfidenceOutOfRange(1.01))
        );
        assert!(VerificationResult::new(false, -0.1).is_err());
        assert!(VerificationResult::new(false, f64::NAN).is_err());
    }

    #[test]
    fn builder_attaches_details_and_reason() {
        let result = VerificationResult::new(false, 0.3)
            .unwrap()
            .with_details(VerificationDetails {
                voice_match_score: Some(0.2),
                ..Default::default()
            })
            .with_reason("voice mismatch");
        assert!(!result.verified());
        assert_eq!(result.reason(), Some("voice mismatch"));
        assert_eq!(result.details().unwrap().voice_match_score, Some(0.2));
    }

    #[test]
    fn serialization_omits_absent_fields() {
        let json = serde_json::to_string(&VerificationResult::new(true, 0.92).unwrap()).unwrap();
        assert_eq!(json, r#"{"verified":true,"confidence":0.92}"#);
    }
}
