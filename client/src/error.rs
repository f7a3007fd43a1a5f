//! The closed error taxonomy surfaced to callers.
//!
//! Every failure inside the client is collapsed into one [`VerifyError`]
//! variant before it reaches the caller. The low-level cause stays
//! reachable through [`std::error::Error::source`] for diagnostics.

use std::error::Error as StdError;
use std::time::Duration;
use thiserror::Error;

use crate::http::BackendError;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("invalid client config: {0}")]
    InvalidConfig(String),

    #[error("invalid verification request: {0}")]
    InvalidRequest(String),

    #[error("{}", api_message(*.status, .message))]
    Api {
        status: Option<u16>,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("network error after {attempts} attempt(s): {message}")]
    Network {
        attempts: u32,
        last_status: Option<u16>,
        message: String,
        #[source]
        source: Option<BackendError>,
    },

    #[error("verification failed: {reason}")]
    VerificationFailed { reason: String },

    /// `attempts` counts status polls, or HTTP attempts when the deadline
    /// ran out during session creation.
    #[error("verification timed out after {attempts} attempt(s) and {elapsed:?}")]
    Timeout { attempts: u32, elapsed: Duration },

    #[error("verification cancelled")]
    Cancelled,
}

fn api_message(status: Option<u16>, message: &str) -> String {
    match status {
        Some(status) => format!("API error (HTTP {status}): {message}"),
        None => format!("API error: {message}"),
    }
}

/// Discriminant of [`VerifyError`], for metrics labels and matching
/// without destructuring.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidConfig,
    InvalidRequest,
    Api,
    Network,
    VerificationFailed,
    Timeout,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidConfig => "invalid_config",
            Self::InvalidRequest => "invalid_request",
            Self::Api => "api_error",
            Self::Network => "network_error",
            Self::VerificationFailed => "verification_failed",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
        }
    }
}

impl VerifyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidConfig(_) => ErrorKind::InvalidConfig,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
            Self::Api { .. } => ErrorKind::Api,
            Self::Network { .. } => ErrorKind::Network,
            Self::VerificationFailed { .. } => ErrorKind::VerificationFailed,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// True for authoritative verification outcomes (the service said no,
    /// or ran out of time) as opposed to infrastructure failures.
    pub fn is_terminal_outcome(&self) -> bool {
        matches!(self, Self::VerificationFailed { .. } | Self::Timeout { .. })
    }

    /// Whether the poll loop may absorb this error and try again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    pub(crate) fn api(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn api_with_source(
        status: Option<u16>,
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Api {
            status,
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => *status,
            Self::Network { last_status, .. } => *last_status,
            _ => None,
        }
    }
}

impl From<voxverify_types::TypesError> for VerifyError {
    fn from(e: voxverify_types::TypesError) -> Self {
        VerifyError::InvalidRequest(e.to_string())
    }
}
