//! Client configuration with TOML and environment support.
//!
//! [`ClientSettings`] is the raw, serde-friendly form (every field public,
//! defaults filled in). Calling [`ClientSettings::build`] validates it and
//! produces the immutable [`ClientConfig`] the client runs on. Every source
//! (code, TOML, environment) goes through the same validation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::VerifyError;

/// Smallest accepted overall verification timeout.
pub const MIN_TIMEOUT_MS: u64 = 1_000;

/// Largest accepted transport retry budget.
pub const MAX_RETRIES: u32 = 10;

/// Deployment tag sent along with every request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = VerifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "staging" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            other => Err(VerifyError::InvalidConfig(format!(
                "unknown environment: {other}"
            ))),
        }
    }
}

/// Unvalidated client settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientSettings {
    /// Base URL of the verification service, e.g. `https://api.example.com/v1`.
    pub base_url: String,

    /// Bearer token, sent as `Authorization: Bearer <key>` when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Overall budget for one verification call, from initiation start.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Extra attempts the transport makes after a 5xx or network failure.
    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default)]
    pub environment: Environment,

    /// Upper bound on status polls per verification.
    #[serde(default = "default_poll_max_attempts")]
    pub poll_max_attempts: u32,

    /// First inter-poll delay; grows by 1.5x per poll.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Cap on the inter-poll delay.
    #[serde(default = "default_poll_max_interval_ms")]
    pub poll_max_interval_ms: u64,

    /// First transport retry delay; doubles per retry.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Cap on the transport retry delay.
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,

    /// Upper bound on a single HTTP attempt.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_timeout_ms() -> u64 {
    30_000
}

fn default_retries() -> u32 {
    3
}

fn default_poll_max_attempts() -> u32 {
    30
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_poll_max_interval_ms() -> u64 {
    5_000
}

fn default_retry_delay_ms() -> u64 {
    1_000
}

fn default_retry_max_delay_ms() -> u64 {
    10_000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

// ── Environment variable names ─────────────────────────────────────────

pub const ENV_BASE_URL: &str = "VOXVERIFY_BASE_URL";
pub const ENV_API_KEY: &str = "VOXVERIFY_API_KEY";
pub const ENV_TIMEOUT_MS: &str = "VOXVERIFY_TIMEOUT_MS";
pub const ENV_RETRIES: &str = "VOXVERIFY_RETRIES";
pub const ENV_ENVIRONMENT: &str = "VOXVERIFY_ENVIRONMENT";

// ── Impl ───────────────────────────────────────────────────────────────

impl ClientSettings {
    /// Settings with every optional field at its default.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout_ms: default_timeout_ms(),
            retries: default_retries(),
            environment: Environment::default(),
            poll_max_attempts: default_poll_max_attempts(),
            poll_interval_ms: default_poll_interval_ms(),
            poll_max_interval_ms: default_poll_max_interval_ms(),
            retry_delay_ms: default_retry_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }

    /// Parse settings from a TOML string. Not validated yet.
    pub fn from_toml_str(s: &str) -> Result<Self, VerifyError> {
        toml::from_str(s).map_err(|e| VerifyError::InvalidConfig(e.to_string()))
    }

    /// Serialize the settings to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, VerifyError> {
        toml::to_string_pretty(self).map_err(|e| VerifyError::InvalidConfig(e.to_string()))
    }

    /// Read settings from `VOXVERIFY_*` variables through `lookup`.
    ///
    /// Only the base URL is required; unset variables keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, VerifyError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(ENV_BASE_URL)
            .ok_or_else(|| VerifyError::InvalidConfig(format!("{ENV_BASE_URL} is not set")))?;
        let mut settings = Self::new(base_url);

        settings.api_key = lookup(ENV_API_KEY).filter(|k| !k.is_empty());
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            settings.timeout_ms = parse_number(ENV_TIMEOUT_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_RETRIES) {
            settings.retries = parse_number(ENV_RETRIES, &raw)?;
        }
        if let Some(raw) = lookup(ENV_ENVIRONMENT) {
            settings.environment = raw.parse()?;
        }
        Ok(settings)
    }

    /// Validate and freeze the settings.
    pub fn build(mut self) -> Result<ClientConfig, VerifyError> {
        let trimmed = self.base_url.trim().trim_end_matches('/').to_string();
        if trimmed.is_empty() {
            return Err(invalid("base_url must not be empty"));
        }
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(invalid(format!(
                "base_url must start with http:// or https://, got {trimmed:?}"
            )));
        }
        self.base_url = trimmed;

        if self.timeout_ms < MIN_TIMEOUT_MS {
            return Err(invalid(format!(
                "timeout_ms must be at least {MIN_TIMEOUT_MS}, got {}",
                self.timeout_ms
            )));
        }
        if self.retries > MAX_RETRIES {
            return Err(invalid(format!(
                "retries must be within [0, {MAX_RETRIES}], got {}",
                self.retries
            )));
        }
        if self.poll_max_attempts == 0 {
            return Err(invalid("poll_max_attempts must be at least 1"));
        }
        if self.poll_interval_ms == 0 || self.poll_max_interval_ms < self.poll_interval_ms {
            return Err(invalid(
                "poll_interval_ms must be non-zero and not exceed poll_max_interval_ms",
            ));
        }
        if self.retry_delay_ms == 0 || self.retry_max_delay_ms < self.retry_delay_ms {
            return Err(invalid(
                "retry_delay_ms must be non-zero and not exceed retry_max_delay_ms",
            ));
        }
        if self.request_timeout_ms == 0 || self.connect_timeout_ms == 0 {
            return Err(invalid("request and connect timeouts must be non-zero"));
        }
        if self.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            self.api_key = None;
        }

        Ok(ClientConfig { settings: self })
    }
}

fn invalid(message: impl Into<String>) -> VerifyError {
    VerifyError::InvalidConfig(message.into())
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T, VerifyError>
where
    T::Err: fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| invalid(format!("{name}={raw:?} is not a valid number: {e}")))
}

impl fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_ms", &self.timeout_ms)
            .field("retries", &self.retries)
            .field("environment", &self.environment)
            .field("poll_max_attempts", &self.poll_max_attempts)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("poll_max_interval_ms", &self.poll_max_interval_ms)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("retry_max_delay_ms", &self.retry_max_delay_ms)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .finish()
    }
}

/// Validated, immutable client configuration.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    settings: ClientSettings,
}

impl ClientConfig {
    /// Start from defaults for the given base URL; finish with `build()`.
    pub fn builder(base_url: impl Into<String>) -> ClientSettings {
        ClientSettings::new(base_url)
    }

    /// Load and validate configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, VerifyError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| invalid(format!("failed to read {}: {e}", path.display())))?;
        ClientSettings::from_toml_str(&content)?.build()
    }

    pub fn from_toml_str(s: &str) -> Result<Self, VerifyError> {
        ClientSettings::from_toml_str(s)?.build()
    }

    /// Load and validate configuration from the process environment.
    pub fn from_env() -> Result<Self, VerifyError> {
        ClientSettings::from_lookup(|name| std::env::var(name).ok())?.build()
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.settings.base_url
    }

    pub fn api_key(&self) -> Option<&str> {
        self.settings.api_key.as_deref()
    }

    pub fn environment(&self) -> Environment {
        self.settings.environment
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.settings.timeout_ms)
    }

    pub fn retries(&self) -> u32 {
        self.settings.retries
    }

    pub fn poll_max_attempts(&self) -> u32 {
        self.settings.poll_max_attempts
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.settings.poll_interval_ms)
    }

    pub fn poll_max_interval(&self) -> Duration {
        Duration::from_millis(self.settings.poll_max_interval_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.settings.retry_delay_ms)
    }

    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.settings.retry_max_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.settings.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.settings.connect_timeout_ms)
    }

    /// Join a relative path (starting with `/`) onto the base URL.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url(), path)
        } else {
            format!("{}/{}", self.base_url(), path)
        }
    }
}
