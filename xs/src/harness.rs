//! Test harness adapter
//!
//! Runs the track's verification command in the exercise directory and
//! parses the combined output into a report. A non-zero exit code is
//! expected when tests fail, so whatever output was produced is parsed
//! rather than treated as an error.

use regex::Regex;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::domain::{CaseOutcome, VerificationReport};
use crate::error::SolveError;
use crate::track::{ReportFormat, TrackProfile};

/// Runs a verification command and parses its output
pub struct TestHarness {
    command: String,
    format: ReportFormat,
    timeout: Duration,
}

impl TestHarness {
    pub fn new(command: impl Into<String>, format: ReportFormat, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            format,
            timeout,
        }
    }

    /// Harness configured from the track profile
    pub fn for_track(track: &str, timeout: Duration) -> Self {
        let profile = TrackProfile::for_track(track);
        Self::new(profile.test_command, profile.format, timeout)
    }

    /// Run the verification command in `dir` and parse the result
    pub async fn run(&self, dir: &Path) -> Result<VerificationReport, SolveError> {
        debug!(command = %self.command, ?dir, timeout_ms = self.timeout.as_millis() as u64, "TestHarness::run: called");

        let output = tokio::time::timeout(
            self.timeout,
            tokio::process::Command::new("sh")
                .arg("-c")
                .arg(&self.command)
                .current_dir(dir)
                .output(),
        )
        .await
        .map_err(|_| {
            debug!(command = %self.command, "TestHarness::run: command timed out");
            SolveError::Timeout(self.timeout)
        })?
        .map_err(|e| SolveError::Verification(format!("failed to run `{}`: {}", self.command, e)))?;

        let exit_code = output.status.code().unwrap_or(-1);
        let combined = format!(
            "{}\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        debug!(exit_code, "TestHarness::run: command completed");

        Ok(parse_report(self.format, &combined))
    }
}

/// Parse harness output using the track's format markers
pub fn parse_report(format: ReportFormat, output: &str) -> VerificationReport {
    match format {
        ReportFormat::Cargo => parse_cargo(output),
        ReportFormat::Make => parse_make(output),
    }
}

fn parse_cargo(output: &str) -> VerificationReport {
    let summary_re = Regex::new(r"(\d+) passed; (\d+) failed").ok();

    let mut passed_count = 0u32;
    let mut failed_count = 0u32;
    let mut saw_summary = false;
    let mut cases = Vec::new();

    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("test result:") {
            if let Some(re) = &summary_re
                && let Some(caps) = re.captures(trimmed)
            {
                // One summary line per test binary; accumulate across them
                passed_count += caps.get(1).and_then(|m| m.as_str().parse::<u32>().ok()).unwrap_or(0);
                failed_count += caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok()).unwrap_or(0);
                saw_summary = true;
            }
        } else if let Some(name) = trimmed.strip_prefix("test ").and_then(|rest| rest.strip_suffix("... ok")) {
            cases.push(CaseOutcome {
                name: name.trim().to_string(),
                passed: true,
                detail: None,
            });
        } else if let Some(name) = trimmed.strip_prefix("test ").and_then(|rest| rest.strip_suffix("... FAILED")) {
            cases.push(CaseOutcome {
                name: name.trim().to_string(),
                passed: false,
                detail: Some(trimmed.to_string()),
            });
        }
    }

    if !saw_summary {
        // No summary lines (compile error, harness crash): fall back to
        // per-case counts, which leaves 0/0 and an explicit non-success
        passed_count = cases.iter().filter(|c| c.passed).count() as u32;
        failed_count = cases.iter().filter(|c| !c.passed).count() as u32;
    }

    VerificationReport::new(passed_count, failed_count, cases, output)
}

fn parse_make(output: &str) -> VerificationReport {
    let mut passed_count = 0u32;
    let mut failed_count = 0u32;
    let mut cases = Vec::new();

    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed.contains("PASS") {
            passed_count += 1;
            cases.push(CaseOutcome {
                name: trimmed.to_string(),
                passed: true,
                detail: None,
            });
        } else if trimmed.contains("FAIL") || trimmed.contains("error:") {
            failed_count += 1;
            cases.push(CaseOutcome {
                name: trimmed.to_string(),
                passed: false,
                detail: Some(trimmed.to_string()),
            });
        }
    }

    VerificationReport::new(passed_count, failed_count, cases, output)
}
