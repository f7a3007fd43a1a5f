#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use serde_json::json;
use voxverify_client::{
    ClientConfig, ClientSettings, HttpResponse, Method, ProgressNotifier, VerificationClient,
};
use voxverify_nullables::{NullBackend, NullClock};
use voxverify_types::ProgressStage;

pub const BASE_URL: &str = "http://verify.test";
pub const SESSION: &str = "sess_1";
pub const STATUS_PATH: &str = "/verify/sess_1/status";

pub type TestClient = VerificationClient<NullBackend, NullClock>;

pub fn settings() -> ClientSettings {
    let mut settings = ClientConfig::builder(BASE_URL);
    settings.api_key = Some("test-key".into());
    settings
}

pub fn client_with(settings: ClientSettings) -> (TestClient, NullBackend, NullClock) {
    let backend = NullBackend::new();
    let clock = NullClock::new();
    let config = settings.build().expect("valid test config");
    let client = VerificationClient::with_parts(config, backend.clone(), clock.clone());
    (client, backend, clock)
}

pub fn client() -> (TestClient, NullBackend, NullClock) {
    client_with(settings())
}

pub fn created(id: &str) -> HttpResponse {
    HttpResponse::json(200, &json!({ "id": id, "status": "pending" }))
}

pub fn pending() -> HttpResponse {
    HttpResponse::json(200, &json!({ "status": "pending" }))
}

pub fn completed(verified: bool, confidence: f64) -> HttpResponse {
    HttpResponse::json(
        200,
        &json!({ "status": "completed", "verified": verified, "confidence": confidence }),
    )
}

pub fn failed(reason: &str) -> HttpResponse {
    HttpResponse::json(200, &json!({ "status": "failed", "error": reason }))
}

/// Script a session that gets created and then reports `polls` in order.
pub fn script_session(backend: &NullBackend, polls: Vec<HttpResponse>) {
    backend.respond(Method::Post, "/verify", created(SESSION));
    backend.script(Method::Get, STATUS_PATH, polls);
}

pub fn recorder() -> (ProgressNotifier, Arc<Mutex<Vec<ProgressStage>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let notifier = ProgressNotifier::from_callback(move |event| {
        sink.lock().unwrap().push(event.stage);
    });
    (notifier, seen)
}
