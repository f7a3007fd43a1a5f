//! Verification sessions and their lifecycle.
//!
//! A session is owned by the remote service. The client only ever holds a
//! read-only copy that it refreshes by polling, so the only mutation
//! offered here is [`VerificationSession::apply`], which enforces the
//! `Pending -> {Completed, Failed}` state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Timestamp, TypesError, VerificationResult};

/// Opaque, server-assigned session identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(raw: impl Into<String>) -> Result<Self, TypesError> {
        let s = raw.into();
        if s.trim().is_empty() {
            return Err(TypesError::EmptySessionId);
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server-side status of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// The call is still being placed or evaluated.
    #[serde(alias = "processing", alias = "in_progress")]
    Pending,
    /// Evaluation finished and a result is available.
    Completed,
    /// The service gave up on the session.
    Failed,
}

impl SessionStatus {
    /// Completed and Failed are terminal; nothing follows them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized observation of the remote session, produced from a status poll.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionUpdate {
    Pending,
    Completed(VerificationResult),
    Failed { reason: String },
}

impl SessionUpdate {
    pub fn status(&self) -> SessionStatus {
        match self {
            Self::Pending => SessionStatus::Pending,
            Self::Completed(_) => SessionStatus::Completed,
            Self::Failed { .. } => SessionStatus::Failed,
        }
    }
}

/// Local, eventually-consistent copy of a remote verification session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerificationSession {
    id: SessionId,
    status: SessionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    result: Option<VerificationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl VerificationSession {
    /// A freshly created session, as returned by the creation call.
    pub fn pending(id: SessionId, now: Timestamp) -> Self {
        Self {
            id,
            status: SessionStatus::Pending,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Present if and only if the status is Completed.
    pub fn result(&self) -> Option<&VerificationResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Apply a polled update.
    ///
    /// Re-observing the same terminal state is a no-op; any other change
    /// after a terminal state is rejected.
    pub fn apply(&mut self, update: SessionUpdate, now: Timestamp) -> Result<(), TypesError> {
        if self.status.is_terminal() {
            if self.status == update.status() {
                return Ok(());
            }
            return Err(TypesError::IllegalTransition {
                id: self.id.to_string(),
                from: self.status,
                to: update.status(),
            });
        }

        match update {
            SessionUpdate::Pending => {}
            SessionUpdate::Completed(result) => {
                self.status = SessionStatus::Completed;
                self.result = Some(result);
            }
            SessionUpdate::Failed { reason } => {
                self.status = SessionStatus::Failed;
                self.error = Some(reason);
            }
        }
        self.updated_at = now;
        Ok(())
    }
}
