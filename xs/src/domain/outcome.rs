//! Submission acknowledgments, remote grading states, and solve outcomes

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Candidate, VerificationReport};

/// Channel acknowledgment for one submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionAck {
    /// Submission accepted; detail carries the tool output or iteration URL
    Accepted { detail: String },

    /// Nothing changed since the last submission; terminal, not an error
    AlreadySubmitted,
}

/// Remote grading state of the latest submitted iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteIterationStatus {
    /// Still being graded
    #[default]
    Pending,

    Passed,

    Failed,

    /// Polling budget exhausted before a terminal state was observed
    Timeout,

    /// Status could not be determined (transient API or parse failure)
    Unknown,
}

impl RemoteIterationStatus {
    /// Terminal states end polling; pending/unknown keep it going
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Passed | Self::Failed | Self::Timeout)
    }
}

impl fmt::Display for RemoteIterationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Timeout => "timeout",
            Self::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Terminal result of one orchestrated solve run
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    /// Whether local verification succeeded within the attempt budget
    pub success: bool,

    /// Number of generate/verify attempts consumed
    pub attempts: u32,

    /// Last candidate that was verified
    pub last_candidate: Candidate,

    /// Report from the last verification run
    pub last_report: VerificationReport,

    /// Delivery acknowledgment, when a submission happened
    pub submission: Option<SubmissionAck>,

    /// Remote grading verdict, when one was observed
    pub remote_status: Option<RemoteIterationStatus>,
}
