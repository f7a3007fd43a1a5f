//! Progress stages reported while a verification call runs.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage of a single verification call.
///
/// Stages are ordered: a call moves forward through `Starting`, `Calling`
/// and `Processing` and ends in exactly one of `Completed` or `Failed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStage {
    /// The call was accepted and is about to contact the service.
    Starting,
    /// A session exists and the service is placing the call.
    Calling,
    /// Waiting for the service to evaluate the answer.
    Processing,
    Completed,
    Failed,
}

impl ProgressStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::Calling => "calling",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ProgressStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
