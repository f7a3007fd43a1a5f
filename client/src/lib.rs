//! Voice verification session client.
//!
//! Opens a verification session for a caller identity, then polls the
//! session until the service reports a terminal state:
//!
//! - [`transport`] issues HTTP requests with bounded exponential retries
//! - [`initiator`] creates the session (`POST /verify`)
//! - [`poller`] drives it to completion (`GET /verify/{id}/status`)
//! - [`normalize`] turns wire payloads into typed results or errors
//! - [`progress`] reports stage changes to an optional observer
//!
//! Every failure reaches the caller as one [`VerifyError`] variant.

pub mod backoff;
pub mod cancel;
pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod initiator;
pub mod metrics;
pub mod normalize;
pub mod options;
pub mod poller;
pub mod progress;
pub mod spans;
pub mod transport;
pub mod wire;

pub use backoff::Backoff;
pub use cancel::{CancelHandle, CancelToken};
pub use client::VerificationClient;
pub use clock::{Clock, Deadline, TokioClock};
pub use config::{ClientConfig, ClientSettings, Environment};
pub use error::{ErrorKind, VerifyError};
pub use http::{
    BackendError, BackendErrorKind, HttpBackend, HttpRequest, HttpResponse, Method, ReqwestBackend,
};
pub use metrics::ClientMetrics;
pub use options::{VerificationOptions, VerificationOptionsBuilder};
pub use progress::{ProgressEvent, ProgressNotifier, ProgressTracker};
pub use transport::{RequestPolicy, Transport};
