//! Solution generator capability
//!
//! Producing candidate source is pluggable per track. Generators are
//! infallible by contract: when they do not recognize an exercise they
//! return a best-effort candidate so the attempt loop can still run and
//! report failure cleanly.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::{Candidate, VerificationReport};
use crate::workspace::ExerciseContext;

mod lookup;
mod stub;

pub use lookup::LookupGenerator;
pub use stub::StubGenerator;

/// Produces and refines solution candidates for one exercise
#[async_trait]
pub trait SolutionGenerator: Send + Sync {
    /// Produce the initial candidate for an exercise
    async fn generate(&self, ctx: &ExerciseContext) -> Candidate;

    /// Produce a refined candidate from the prior one and its
    /// verification report
    async fn improve(&self, prior: &Candidate, report: &VerificationReport, ctx: &ExerciseContext) -> Candidate;
}

/// Default generator for a track: known-solution lookup backed by the
/// signature-stub fallback
pub fn default_generator(track: &str) -> Arc<dyn SolutionGenerator> {
    Arc::new(LookupGenerator::for_track(track))
}
