//! exsolver - autonomous exercise solver for the Exercism platform
//!
//! Core pipeline: materialize an exercise into the local workspace,
//! generate a candidate solution, verify it with the track's test
//! harness, refine on failure, deliver through a channel once it
//! passes, and confirm the remote grading verdict.

pub mod cli;
pub mod config;
pub mod delivery;
pub mod domain;
pub mod error;
pub mod generator;
pub mod harness;
pub mod monitor;
pub mod platform;
pub mod solve;
pub mod track;
pub mod workspace;

pub use config::Config;
pub use domain::{Candidate, CaseOutcome, Exercise, ExerciseListing, RemoteIterationStatus, SolveOutcome, SubmissionAck, VerificationReport};
pub use error::SolveError;
pub use solve::{EngineConfig, SolveEngine};
pub use workspace::{ExerciseContext, WorkspaceStore};
