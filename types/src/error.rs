//! Error type for constructing and mutating the data model.

use thiserror::Error;

use crate::SessionStatus;

#[derive(Debug, Error, PartialEq)]
pub enum TypesError {
    #[error("session id must not be empty")]
    EmptySessionId,

    #[error("confidence {0} is outside [0.0, 1.0]")]
    ConfidenceOutOfRange(f64),

    #[error("invalid email address: {0:?}")]
    InvalidEmail(String),

    #[error("either an email or a transaction id is required")]
    MissingIdentity,

    #[error("transaction id must not be empty")]
    EmptyTransactionId,

    #[error("session {id} is already {from:?}; cannot move to {to:?}")]
    IllegalTransition {
        id: String,
        from: SessionStatus,
        to: SessionStatus,
    },
}
