//! Domain types for exercises, candidates, and solve outcomes

mod candidate;
mod exercise;
mod outcome;
mod report;

pub use candidate::Candidate;
pub use exercise::{Exercise, ExerciseListing};
pub use outcome::{RemoteIterationStatus, SolveOutcome, SubmissionAck};
pub use report::{CaseOutcome, VerificationReport};
