//! HTTP backend abstraction.
//!
//! The transport speaks to the remote service through [`HttpBackend`], so
//! the retry and polling logic can be driven by a real `reqwest` client in
//! production and by a scripted backend in tests.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::config::ClientConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved request, ready to be put on the wire.
#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
    /// Upper bound on this single attempt.
    pub timeout: Duration,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, value.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }

    /// Body as text, lossily decoded, for error messages.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// What went wrong below HTTP: the request never produced a response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendErrorKind {
    Timeout,
    Connect,
    Other,
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Executes a single HTTP attempt. Retrying is the transport's job.
pub trait HttpBackend: Send + Sync {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, BackendError>> + Send;
}

/// Production backend backed by a pooled `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestBackend {
    http_client: reqwest::Client,
}

impl ReqwestBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, BackendError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| {
                BackendError::new(
                    BackendErrorKind::Other,
                    format!("failed to create HTTP client: {e}"),
                )
            })?;
        Ok(Self { http_client })
    }
}

impl HttpBackend for ReqwestBackend {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, BackendError> {
        let mut builder = match request.method {
            Method::Get => self.http_client.get(&request.url),
            Method::Post => self.http_client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .timeout(request.timeout)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(classify)?;
        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }
}

fn classify(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::new(BackendErrorKind::Timeout, format!("request timed out: {e}"))
    } else if e.is_connect() {
        BackendError::new(BackendErrorKind::Connect, format!("connection failed: {e}"))
    } else {
        BackendError::new(BackendErrorKind::Other, e.to_string())
    }
}
