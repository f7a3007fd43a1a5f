//! Webhook HTTP server.
//!
//! Accepts deliveries at `POST /webhook`, verifies them and publishes the
//! decoded events on a broadcast channel. Subscribers that fall behind
//! miss events; the sender never waits for them.

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    routing::post,
    Json, Router,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use voxverify_types::Timestamp;

use crate::{WebhookError, WebhookEvent, WebhookVerifier};

/// Header carrying the hex HMAC-SHA256 of the body.
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Shared state for the webhook server.
pub struct WebhookState {
    verifier: WebhookVerifier,
    events_tx: broadcast::Sender<WebhookEvent>,
}

impl WebhookState {
    pub fn new(verifier: WebhookVerifier, channel_capacity: usize) -> Self {
        let (events_tx, _) = broadcast::channel(channel_capacity.max(1));
        Self {
            verifier,
            events_tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WebhookEvent> {
        self.events_tx.subscribe()
    }

    pub fn verifier(&self) -> &WebhookVerifier {
        &self.verifier
    }

    /// Verify, decode and publish one delivery.
    pub fn accept(
        &self,
        body: &[u8],
        signature: Option<&str>,
        now: Timestamp,
    ) -> Result<WebhookEvent, WebhookError> {
        self.verifier.verify(body, signature)?;
        let event = WebhookEvent::from_slice(body)?;
        self.verifier.check_fresh(&event, now)?;
        // No subscribers is fine.
        let _ = self.events_tx.send(event.clone());
        Ok(event)
    }
}

pub fn router(state: Arc<WebhookState>) -> Router {
    Router::new()
        .route("/webhook", post(receive))
        .with_state(state)
}

async fn receive(
    State(state): State<Arc<WebhookState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, WebhookError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    match state.accept(&body, signature, Timestamp::now()) {
        Ok(event) => {
            debug!(
                event = %event.event,
                session = event.data.session_id.as_deref().unwrap_or("-"),
                "webhook accepted"
            );
            Ok(Json(serde_json::json!({ "received": true })))
        }
        Err(e) => {
            warn!("webhook rejected: {e}");
            Err(e)
        }
    }
}

/// The webhook server, configured with a port and shared state.
pub struct WebhookServer {
    pub port: u16,
    pub state: Arc<WebhookState>,
}

impl WebhookServer {
    /// Create a new server with a default channel capacity of 256.
    pub fn new(port: u16, verifier: WebhookVerifier) -> Self {
        Self {
            port,
            state: Arc::new(WebhookState::new(verifier, 256)),
        }
    }

    pub fn with_state(port: u16, state: Arc<WebhookState>) -> Self {
        Self { port, state }
    }

    /// Listen for deliveries until the process is shut down.
    pub async fn start(&self) -> Result<(), WebhookError> {
        let app = router(self.state.clone());
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!(
            signed = self.state.verifier.requires_signature(),
            "webhook server listening on {}", addr
        );
        axum::serve(listener, app).await?;
        Ok(())
    }
}
