//! Local verification reports

use serde::{Deserialize, Serialize};

/// Outcome of a single test case
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseOutcome {
    /// Test case name as reported by the harness
    pub name: String,

    pub passed: bool,

    /// Failure detail, when the harness provided any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Structured result of running the verification harness once
#[derive(Debug, Clone, Default)]
pub struct VerificationReport {
    pub passed_count: u32,
    pub failed_count: u32,

    /// Per-case outcomes, when the output format exposes them
    pub cases: Vec<CaseOutcome>,

    /// Raw combined harness output, kept for refinement and diagnostics
    pub raw_output: String,
}

impl VerificationReport {
    pub fn new(passed_count: u32, failed_count: u32, cases: Vec<CaseOutcome>, raw_output: impl Into<String>) -> Self {
        Self {
            passed_count,
            failed_count,
            cases,
            raw_output: raw_output.into(),
        }
    }

    pub fn total_count(&self) -> u32 {
        self.passed_count + self.failed_count
    }

    /// A run that discovered zero tests is never a success
    pub fn all_passed(&self) -> bool {
        self.failed_count == 0 && self.total_count() > 0
    }

    /// Failing subset of the per-case outcomes
    pub fn failing_cases(&self) -> Vec<&CaseOutcome> {
        self.cases.iter().filter(|c| !c.passed).collect()
    }

    pub fn summary(&self) -> String {
        format!("{}/{} tests passed", self.passed_count, self.total_count())
    }
}
