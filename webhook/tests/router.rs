use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;
use voxverify_types::Timestamp;
use voxverify_webhook::{router, WebhookState, WebhookVerifier, SIGNATURE_HEADER};

fn body() -> String {
    format!(
        r#"{{"event":"verification.completed","timestamp":{},"data":{{"sessionId":"sess_9","verified":true,"confidence":0.88}}}}"#,
        Timestamp::now().as_secs()
    )
}

fn post(body: String, signature: Option<String>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json");
    if let Some(sig) = signature {
        builder = builder.header(SIGNATURE_HEADER, sig);
    }
    builder.body(Body::from(body)).unwrap()
}

fn signed_state() -> Arc<WebhookState> {
    Arc::new(WebhookState::new(
        WebhookVerifier::new(Some("whsec_test".into())).with_max_age(300),
        16,
    ))
}

#[tokio::test]
async fn signed_delivery_is_accepted_and_broadcast() {
    let state = signed_state();
    let mut events = state.subscribe();
    let body = body();
    let signature = state.verifier().sign(body.as_bytes()).unwrap();

    let response = router(state.clone())
        .oneshot(post(body, Some(format!("sha256={signature}"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json, serde_json::json!({ "received": true }));

    let event = events.try_recv().unwrap();
    assert_eq!(event.event, "verification.completed");
    assert_eq!(event.data.session_id.as_deref(), Some("sess_9"));
    assert_eq!(event.data.confidence, Some(0.88));
}

#[tokio::test]
async fn bad_or_missing_signature_is_unauthorized() {
    let state = signed_state();
    let mut events = state.subscribe();

    for signature in [None, Some("deadbeef".to_string())] {
        let response = router(state.clone())
            .oneshot(post(body(), signature))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn malformed_payload_is_bad_request() {
    let state = Arc::new(WebhookState::new(WebhookVerifier::new(None), 16));

    let response = router(state)
        .oneshot(post("{\"timestamp\":1}".into(), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stale_delivery_is_rejected() {
    let state = signed_state();
    let stale = r#"{"event":"verification.completed","timestamp":1000}"#.to_string();
    let signature = state.verifier().sign(stale.as_bytes()).unwrap();

    let response = router(state)
        .oneshot(post(stale, Some(signature)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unsigned_mode_accepts_plain_deliveries() {
    let state = Arc::new(WebhookState::new(WebhookVerifier::new(None), 16));

    let response = router(state).oneshot(post(body(), None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn zero_capacity_state_still_broadcasts() {
    let state = Arc::new(WebhookState::new(WebhookVerifier::new(None), 0));
    let mut events = state.subscribe();

    let response = router(state).oneshot(post(body(), None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(events.try_recv().unwrap().event, "verification.completed");
}
