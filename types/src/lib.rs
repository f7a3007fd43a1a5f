//! Fundamental types for voice verification sessions.
//!
//! This crate defines the data model shared by the client, the webhook
//! receiver and the CLI: session identifiers and states, verification
//! results, caller identity, progress stages and timestamps.

pub mod error;
pub mod identity;
pub mod progress;
pub mod result;
pub mod session;
pub mod time;

pub use error::TypesError;
pub use identity::{CustomerData, Identity, RiskLevel};
pub use progress::ProgressStage;
pub use result::{VerificationDetails, VerificationResult};
pub use session::{SessionId, SessionStatus, SessionUpdate, VerificationSession};
pub use time::Timestamp;
