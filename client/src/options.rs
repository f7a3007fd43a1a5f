//! Per-call verification options.

use std::time::Duration;

use voxverify_types::{CustomerData, Identity, RiskLevel};

use crate::cancel::CancelToken;
use crate::config::{MAX_RETRIES, MIN_TIMEOUT_MS};
use crate::progress::ProgressNotifier;
use crate::VerifyError;

/// Everything a single verification call needs from its caller.
///
/// Built with [`VerificationOptions::builder`]; `build()` rejects
/// out-of-range overrides before anything touches the network.
#[derive(Clone, Debug)]
pub struct VerificationOptions {
    identity: Identity,
    customer_data: Option<CustomerData>,
    risk_level: Option<RiskLevel>,
    timeout: Option<Duration>,
    retries: Option<u32>,
    max_attempts: Option<u32>,
    progress: ProgressNotifier,
    cancel: CancelToken,
}

impl VerificationOptions {
    pub fn builder(identity: Identity) -> VerificationOptionsBuilder {
        VerificationOptionsBuilder {
            options: Self {
                identity,
                customer_data: None,
                risk_level: None,
                timeout: None,
                retries: None,
                max_attempts: None,
                progress: ProgressNotifier::disabled(),
                cancel: CancelToken::never(),
            },
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn customer_data(&self) -> Option<&CustomerData> {
        self.customer_data.as_ref()
    }

    pub fn risk_level(&self) -> Option<RiskLevel> {
        self.risk_level
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn retries(&self) -> Option<u32> {
        self.retries
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    pub fn progress(&self) -> &ProgressNotifier {
        &self.progress
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Check the caller contract. Identity fields may have been built
    /// without their constructors, so they are re-checked here too.
    pub fn validate(&self) -> Result<(), VerifyError> {
        self.identity.validate()?;
        if let Some(timeout) = self.timeout {
            if timeout < Duration::from_millis(MIN_TIMEOUT_MS) {
                return Err(VerifyError::InvalidRequest(format!(
                    "timeout override must be at least {MIN_TIMEOUT_MS} ms, got {} ms",
                    timeout.as_millis()
                )));
            }
        }
        if let Some(retries) = self.retries {
            if retries > MAX_RETRIES {
                return Err(VerifyError::InvalidRequest(format!(
                    "retries override must be within [0, {MAX_RETRIES}], got {retries}"
                )));
            }
        }
        if self.max_attempts == Some(0) {
            return Err(VerifyError::InvalidRequest(
                "max_attempts override must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

pub struct VerificationOptionsBuilder {
    options: VerificationOptions,
}

impl VerificationOptionsBuilder {
    pub fn customer_data(mut self, data: CustomerData) -> Self {
        self.options.customer_data = Some(data);
        self
    }

    pub fn risk_level(mut self, level: RiskLevel) -> Self {
        self.options.risk_level = Some(level);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.options.retries = Some(retries);
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.options.max_attempts = Some(max_attempts);
        self
    }

    pub fn progress(mut self, notifier: ProgressNotifier) -> Self {
        self.options.progress = notifier;
        self
    }

    pub fn cancel_token(mut self, token: CancelToken) -> Self {
        self.options.cancel = token;
        self
    }

    pub fn build(self) -> Result<VerificationOptions, VerifyError> {
        self.options.validate()?;
        Ok(self.options)
    }
}
