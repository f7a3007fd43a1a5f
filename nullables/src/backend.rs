//! Nullable HTTP backend: scripted responses, recorded requests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use voxverify_client::{
    BackendError, BackendErrorKind, HttpBackend, HttpRequest, HttpResponse, Method,
};

use crate::NullClock;

/// One scripted outcome for a request.
#[derive(Clone, Debug)]
pub enum Scripted {
    Response(HttpResponse),
    Error(BackendError),
    /// Never completes; for cancellation tests.
    Hang,
}

impl From<HttpResponse> for Scripted {
    fn from(response: HttpResponse) -> Self {
        Self::Response(response)
    }
}

impl From<BackendError> for Scripted {
    fn from(error: BackendError) -> Self {
        Self::Error(error)
    }
}

#[derive(Default)]
struct Inner {
    routes: HashMap<(Method, String), VecDeque<Scripted>>,
    requests: Vec<HttpRequest>,
    fallback: Option<HttpResponse>,
    latency: Option<(Duration, NullClock)>,
}

/// A test backend that answers from per-route scripts instead of the
/// network.
///
/// Each `(method, path)` route holds a queue of outcomes. Requests pop
/// from the front; the last outcome repeats forever, so a script ending in
/// "pending" keeps the session pending. Unscripted routes get the fallback
/// response, 404 by default.
/// Clones share scripts and the request log.
#[derive(Clone, Default)]
pub struct NullBackend {
    inner: Arc<Mutex<Inner>>,
}

impl NullBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append outcomes to a route's script.
    pub fn script<I>(&self, method: Method, path: &str, outcomes: I) -> &Self
    where
        I: IntoIterator,
        I::Item: Into<Scripted>,
    {
        self.lock()
            .routes
            .entry((method, path.to_string()))
            .or_default()
            .extend(outcomes.into_iter().map(Into::into));
        self
    }

    pub fn respond(&self, method: Method, path: &str, response: HttpResponse) -> &Self {
        self.script(method, path, [response])
    }

    pub fn respond_json(
        &self,
        method: Method,
        path: &str,
        status: u16,
        body: serde_json::Value,
    ) -> &Self {
        self.respond(method, path, HttpResponse::json(status, &body))
    }

    pub fn fail(&self, method: Method, path: &str, kind: BackendErrorKind) -> &Self {
        self.script(
            method,
            path,
            [BackendError::new(kind, format!("simulated {kind:?} failure"))],
        )
    }

    pub fn hang(&self, method: Method, path: &str) -> &Self {
        self.script(method, path, [Scripted::Hang])
    }

    /// Answer unscripted routes with `response`.
    pub fn fallback(&self, response: HttpResponse) -> &Self {
        self.lock().fallback = Some(response);
        self
    }

    /// Advance `clock` by `latency` on every request.
    pub fn with_latency(&self, latency: Duration, clock: NullClock) -> &Self {
        self.lock().latency = Some((latency, clock));
        self
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.lock().requests.clone()
    }

    pub fn request_count(&self, method: Method, path: &str) -> usize {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.method == method && path_of(&r.url) == path)
            .count()
    }

    fn next(&self, request: HttpRequest) -> Scripted {
        let mut inner = self.lock();
        if let Some((latency, clock)) = &inner.latency {
            clock.advance(*latency);
        }
        let key = (request.method, path_of(&request.url).to_string());
        inner.requests.push(request);
        let scripted = inner.routes.get_mut(&key).and_then(|queue| {
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        });
        scripted.unwrap_or_else(|| match &inner.fallback {
            Some(response) => Scripted::Response(response.clone()),
            None => not_found(),
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl HttpBackend for NullBackend {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, BackendError> {
        match self.next(request) {
            Scripted::Response(response) => Ok(response),
            Scripted::Error(error) => Err(error),
            Scripted::Hang => std::future::pending().await,
        }
    }
}

fn not_found() -> Scripted {
    Scripted::Response(HttpResponse::json(
        404,
        &serde_json::json!({ "error": "no such route" }),
    ))
}

/// The path component of an absolute URL.
fn path_of(url: &str) -> &str {
    let after_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let path = after_scheme
        .find('/')
        .map_or("/", |i| &after_scheme[i..]);
    path.split('?').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use voxverify_client::Clock;

    fn request(method: Method, url: &str) -> HttpRequest {
        HttpRequest {
            method,
            url: url.to_string(),
            headers: Vec::new(),
            body: None,
            timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn path_of_strips_scheme_host_and_query() {
        assert_eq!(path_of("http://127.0.0.1:8080/verify"), "/verify");
        assert_eq!(path_of("https://api.test/verify/x/status?a=1"), "/verify/x/status");
        assert_eq!(path_of("https://api.test"), "/");
    }

    #[tokio::test]
    async fn last_scripted_outcome_repeats() {
        let backend = NullBackend::new();
        backend.script(
            Method::Get,
            "/s",
            [
                HttpResponse::json(500, &json!({})),
                HttpResponse::json(200, &json!({"status": "pending"})),
            ],
        );

        let url = "http://svc/s";
        assert_eq!(backend.execute(request(Method::Get, url)).await.unwrap().status, 500);
        for _ in 0..3 {
            assert_eq!(backend.execute(request(Method::Get, url)).await.unwrap().status, 200);
        }
        assert_eq!(backend.request_count(Method::Get, "/s"), 4);
    }

    #[tokio::test]
    async fn unscripted_route_is_404() {
        let backend = NullBackend::new();
        let response = backend
            .execute(request(Method::Post, "http://svc/missing"))
            .await
            .unwrap();
        assert_eq!(response.status, 404);
    }

    #[tokio::test]
    async fn fallback_answers_unscripted_routes() {
        let backend = NullBackend::new();
        backend.fallback(HttpResponse::json(503, &json!({ "error": "down" })));
        let response = backend
            .execute(request(Method::Get, "http://svc/anything"))
            .await
            .unwrap();
        assert_eq!(response.status, 503);
    }

    #[tokio::test]
    async fn scripted_errors_and_latency() {
        let clock = NullClock::new();
        let backend = NullBackend::new();
        backend
            .fail(Method::Get, "/s", BackendErrorKind::Connect)
            .with_latency(Duration::from_millis(250), clock.clone());

        let err = backend
            .execute(request(Method::Get, "http://svc/s"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, BackendErrorKind::Connect);
        assert_eq!(clock.now(), Duration::from_millis(250));
    }
}
