//! Delivery channel abstraction
//!
//! How an accepted candidate reaches the remote platform is pluggable:
//! the direct channel drives the official submission tool, the
//! interactive channel drives the web editor. The orchestrator only
//! sees this trait; channel selection is configuration.

use async_trait::async_trait;

use crate::domain::{Candidate, Exercise, RemoteIterationStatus, SubmissionAck};
use crate::error::SolveError;
use crate::workspace::ExerciseContext;

mod direct;
mod interactive;

pub use direct::DirectChannel;
pub use interactive::InteractiveChannel;

#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Push a locally verified candidate to the platform
    async fn submit(&self, candidate: &Candidate, ctx: &ExerciseContext) -> Result<SubmissionAck, SolveError>;

    /// Remote grading status of the latest submitted iteration
    async fn query_status(&self, exercise: &Exercise) -> Result<RemoteIterationStatus, SolveError>;
}
