//! Per-track verification profiles

/// How harness output is parsed into a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// `cargo test` output: "N passed; M failed" summaries plus
    /// "... ok" / "... FAILED" per-case lines
    Cargo,

    /// Makefile-driven output: per-line PASS/FAIL markers
    Make,
}

/// Track-specific verification knowledge
#[derive(Debug, Clone)]
pub struct TrackProfile {
    /// Shell command that runs the exercise's test suite
    pub test_command: String,

    pub format: ReportFormat,
}

impl TrackProfile {
    /// Profile for a track slug. Unrecognized tracks get the Makefile
    /// convention, which is what most non-Rust tracks ship with.
    pub fn for_track(track: &str) -> Self {
        match track {
            "rust" => Self {
                test_command: "cargo test".to_string(),
                format: ReportFormat::Cargo,
            },
            _ => Self {
                test_command: "make test".to_string(),
                format: ReportFormat::Make,
            },
        }
    }
}
