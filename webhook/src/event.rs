//! Webhook payloads.

use serde::{Deserialize, Serialize};
use voxverify_types::Timestamp;

use crate::WebhookError;

/// One event delivered by the verification service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Event name, e.g. `verification.completed`.
    pub event: String,
    pub timestamp: Timestamp,
    #[serde(default)]
    pub data: EventData,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// The caller's spoken answer, as transcribed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, alias = "session_id", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl WebhookEvent {
    /// Decode and sanity-check a raw body.
    pub fn from_slice(body: &[u8]) -> Result<Self, WebhookError> {
        let event: Self = serde_json::from_slice(body)
            .map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;
        if event.event.trim().is_empty() {
            return Err(WebhookError::InvalidPayload("event name is empty".into()));
        }
        if let Some(c) = event.data.confidence {
            if !(0.0..=1.0).contains(&c) {
                return Err(WebhookError::InvalidPayload(format!(
                    "confidence {c} outside [0, 1]"
                )));
            }
        }
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_camel_and_snake_session_id() {
        let camel = br#"{"event":"verification.completed","timestamp":1700000000,
            "data":{"sessionId":"s1","verified":true,"confidence":0.9}}"#;
        let snake = br#"{"event":"verification.completed","timestamp":1700000000,
            "data":{"session_id":"s1"}}"#;

        let a = WebhookEvent::from_slice(camel).unwrap();
        let b = WebhookEvent::from_slice(snake).unwrap();
        assert_eq!(a.data.session_id.as_deref(), Some("s1"));
        assert_eq!(b.data.session_id.as_deref(), Some("s1"));
        assert_eq!(a.data.verified, Some(true));
        assert_eq!(a.timestamp, Timestamp::new(1_700_000_000));
    }

    #[test]
    fn data_is_optional() {
        let event = WebhookEvent::from_slice(br#"{"event":"ping","timestamp":1}"#).unwrap();
        assert_eq!(event.data, EventData::default());
    }

    #[test]
    fn rejects_malformed_payloads() {
        for body in [
            &b"not json"[..],
            br#"{"timestamp":1}"#,
            br#"{"event":" ","timestamp":1}"#,
            br#"{"event":"x","timestamp":1,"data":{"confidence":1.5}}"#,
        ] {
            assert!(matches!(
                WebhookEvent::from_slice(body),
                Err(WebhookError::InvalidPayload(_))
            ));
        }
    }
}
