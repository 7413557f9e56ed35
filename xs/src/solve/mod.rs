//! Solve orchestration

mod engine;

pub use engine::{EngineConfig, SolveEngine};
