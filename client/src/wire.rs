//! JSON bodies exchanged with the verification service.

use serde::{Deserialize, Serialize};
use voxverify_types::{CustomerData, Identity, RiskLevel, SessionStatus};

/// Body of `POST /verify`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_data: Option<&'a CustomerData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
}

impl<'a> CreateSessionRequest<'a> {
    pub fn new(
        identity: &'a Identity,
        customer_data: Option<&'a CustomerData>,
        risk_level: Option<RiskLevel>,
    ) -> Self {
        Self {
            email: identity.email_address(),
            transaction_id: identity.transaction_id(),
            customer_data: customer_data.filter(|c| !c.is_empty()),
            risk_level,
        }
    }
}

/// Response of `POST /verify`.
#[derive(Debug, Deserialize)]
pub struct CreateSessionResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<SessionStatus>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of `GET /verify/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    pub status: SessionStatus,
    #[serde(default)]
    pub verified: Option<bool>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub details: Option<WireDetails>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireDetails {
    #[serde(default)]
    pub phrase_accuracy: Option<f64>,
    #[serde(default)]
    pub voice_match_score: Option<f64>,
    #[serde(default)]
    pub fingerprint_valid: Option<bool>,
    /// Milliseconds.
    #[serde(default)]
    pub processing_time: Option<u64>,
}

/// Error body some endpoints return alongside a 4xx/5xx.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default, alias = "message")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_uses_camel_case_and_skips_absent_fields() {
        let identity = Identity::transaction("tx_42").unwrap();
        let body = CreateSessionRequest::new(&identity, None, Some(RiskLevel::High));
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "transactionId": "tx_42", "riskLevel": "high" })
        );
    }

    #[test]
    fn empty_customer_data_is_not_sent() {
        let identity = Identity::email("a@b.io").unwrap();
        let empty = CustomerData::default();
        let body = CreateSessionRequest::new(&identity, Some(&empty), None);
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("customerData").is_none());
        assert_eq!(json["email"], "a@b.io");
    }

    #[test]
    fn status_response_with_details() {
        let raw = r#"{
            "status": "completed",
            "verified": true,
            "confidence": 0.92,
            "details": { "phraseAccuracy": 0.9, "voiceMatchScore": 0.95,
                         "fingerprintValid": true, "processingTime": 840 }
        }"#;
        let resp: StatusResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.status, SessionStatus::Completed);
        let details = resp.details.unwrap();
        assert_eq!(details.processing_time, Some(840));
        assert_eq!(details.fingerprint_valid, Some(true));
    }
}
