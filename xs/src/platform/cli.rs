//! Submission tool wrapper
//!
//! Wraps the platform's official CLI binary for configure, download,
//! submit, and status. Every invocation runs under an explicit timeout.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::domain::{Exercise, RemoteIterationStatus};
use crate::error::SolveError;

/// Captured output of one tool invocation
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    /// Stdout and stderr joined; the tool splits messages between both
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// Handle to the local submission tool binary
pub struct SubmissionTool {
    bin: PathBuf,
    token: String,
    workspace: PathBuf,
    timeout: Duration,
}

impl SubmissionTool {
    pub fn new(
        bin: impl Into<PathBuf>,
        token: impl Into<String>,
        workspace: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            bin: bin.into(),
            token: token.into(),
            workspace: workspace.into(),
            timeout,
        }
    }

    async fn run(&self, args: &[&str], cwd: Option<&Path>) -> Result<ToolOutput, SolveError> {
        debug!(bin = ?self.bin, ?args, "SubmissionTool::run: called");

        let mut cmd = tokio::process::Command::new(&self.bin);
        cmd.args(args).env("EXERCISM_TOKEN", &self.token);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                debug!(?args, "SubmissionTool::run: invocation timed out");
                SolveError::Timeout(self.timeout)
            })?
            .map_err(SolveError::Io)?;

        let result = ToolOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };
        debug!(exit_code = result.exit_code, "SubmissionTool::run: invocation completed");
        Ok(result)
    }

    /// Point the tool at our token and workspace root. Run once at startup.
    pub async fn configure(&self) -> Result<(), SolveError> {
        debug!(workspace = ?self.workspace, "SubmissionTool::configure: called");
        let token_arg = format!("--token={}", self.token);
        let workspace_arg = format!("--workspace={}", self.workspace.display());
        let out = self.run(&["configure", &token_arg, &workspace_arg], None).await?;

        if out.exit_code != 0 {
            return Err(SolveError::Delivery(format!(
                "tool configure failed: {}",
                first_line(&out.combined())
            )));
        }
        Ok(())
    }

    /// Download an exercise. Returns the directory the tool reported,
    /// when its output named one.
    pub async fn download(&self, exercise: &Exercise) -> Result<Option<PathBuf>, SolveError> {
        debug!(%exercise, "SubmissionTool::download: called");
        let track_arg = format!("--track={}", exercise.track);
        let exercise_arg = format!("--exercise={}", exercise.slug);
        let out = self.run(&["download", &track_arg, &exercise_arg], None).await?;
        let combined = out.combined();

        if out.exit_code != 0 {
            if is_rate_limited_output(&combined) {
                return Err(SolveError::RateLimited {
                    retry_after: parse_retry_after(&combined),
                });
            }
            return Err(SolveError::ExerciseUnavailable(format!(
                "{}: {}",
                exercise,
                first_line(&combined)
            )));
        }

        let dir = combined
            .lines()
            .find_map(|line| line.trim().strip_prefix("Downloaded to:"))
            .map(|path| PathBuf::from(path.trim()));
        debug!(?dir, "SubmissionTool::download: parsed download directory");
        Ok(dir)
    }

    /// Submit a solution file. Interpretation of the output (no-changes,
    /// rate limits) is the delivery channel's job.
    pub async fn submit(&self, solution_file: &Path) -> Result<ToolOutput, SolveError> {
        debug!(?solution_file, "SubmissionTool::submit: called");
        let file = solution_file.display().to_string();
        self.run(&["submit", &file], solution_file.parent()).await
    }

    /// Query the tool for an exercise's submission status
    pub async fn status(&self, exercise: &Exercise) -> Result<ToolOutput, SolveError> {
        debug!(%exercise, "SubmissionTool::status: called");
        let track_arg = format!("--track={}", exercise.track);
        let exercise_arg = format!("--exercise={}", exercise.slug);
        self.run(&["status", &track_arg, &exercise_arg], None).await
    }
}

/// Map the tool's status output onto a grading state; None when the
/// output names no recognizable state
pub fn parse_status_output(text: &str) -> Option<RemoteIterationStatus> {
    let lower = text.to_lowercase();
    if lower.contains("completed") || lower.contains("passed") {
        Some(RemoteIterationStatus::Passed)
    } else if lower.contains("failed") {
        Some(RemoteIterationStatus::Failed)
    } else if lower.contains("pending") || lower.contains("in progress") || lower.contains("processing") {
        Some(RemoteIterationStatus::Pending)
    } else {
        None
    }
}

/// Check tool output for rate-limit phrasing
pub fn is_rate_limited_output(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("rate limit") || lower.contains("too many requests")
}

/// Extract a suggested wait ("try again in 30 seconds") from tool output
pub fn parse_retry_after(text: &str) -> Option<Duration> {
    let re = Regex::new(r"(?i)(?:retry|try again)\D*(\d+)\s*s").ok()?;
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn first_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("no output")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_detection() {
        assert!(is_rate_limited_output("Error: rate limit exceeded"));
        assert!(is_rate_limited_output("HTTP 429 Too Many Requests"));
        assert!(!is_rate_limited_output("Error: exercise not found"));
    }

    #[test]
    fn test_parse_retry_after() {
        assert_eq!(
            parse_retry_after("rate limit exceeded, try again in 30 seconds"),
            Some(Duration::from_secs(30))
        );
        assert_eq!(
            parse_retry_after("please retry in 5s"),
            Some(Duration::from_secs(5))
        );
        assert_eq!(parse_retry_after("rate limit exceeded"), None);
    }

    #[test]
    fn test_parse_status_output() {
        assert_eq!(
            parse_status_output("Status: completed (all tests passed)"),
            Some(RemoteIterationStatus::Passed)
        );
        assert_eq!(parse_status_output("Latest iteration failed"), Some(RemoteIterationStatus::Failed));
        assert_eq!(parse_status_output("Tests are in progress"), Some(RemoteIterationStatus::Pending));
        assert_eq!(parse_status_output("some unrelated output"), None);
    }

    #[test]
    fn test_combined_output_joins_streams() {
        let out = ToolOutput {
            exit_code: 0,
            stdout: "Downloaded to: /tmp/ws/rust/leap".to_string(),
            stderr: String::new(),
        };
        assert!(out.combined().contains("Downloaded to:"));
    }

    #[tokio::test]
    async fn test_download_parses_reported_directory() {
        // Fake the tool with a shell script that emits the download line
        let temp = tempfile::tempdir().unwrap();
        let script = temp.path().join("fake-tool.sh");
        std::fs::write(&script, "#!/bin/sh\necho 'Downloaded to: /tmp/ws/rust/leap'\n").unwrap();
        make_executable(&script);

        let tool = SubmissionTool::new(&script, "tok", temp.path(), Duration::from_secs(5));
        let dir = tool.download(&Exercise::new("rust", "leap")).await.unwrap();
        assert_eq!(dir, Some(PathBuf::from("/tmp/ws/rust/leap")));
    }

    #[tokio::test]
    async fn test_download_failure_maps_to_unavailable() {
        let temp = tempfile::tempdir().unwrap();
        let script = temp.path().join("fake-tool.sh");
        std::fs::write(&script, "#!/bin/sh\necho 'Error: exercise is locked' >&2\nexit 1\n").unwrap();
        make_executable(&script);

        let tool = SubmissionTool::new(&script, "tok", temp.path(), Duration::from_secs(5));
        let err = tool.download(&Exercise::new("rust", "leap")).await.unwrap_err();
        assert!(matches!(err, SolveError::ExerciseUnavailable(_)));
    }

    #[tokio::test]
    async fn test_download_rate_limit_maps_with_wait() {
        let temp = tempfile::tempdir().unwrap();
        let script = temp.path().join("fake-tool.sh");
        std::fs::write(
            &script,
            "#!/bin/sh\necho 'rate limit exceeded, try again in 2 seconds' >&2\nexit 1\n",
        )
        .unwrap();
        make_executable(&script);

        let tool = SubmissionTool::new(&script, "tok", temp.path(), Duration::from_secs(5));
        let err = tool.download(&Exercise::new("rust", "leap")).await.unwrap_err();
        assert!(err.is_rate_limited());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(2)));
    }

    fn make_executable(path: &Path) {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(path, perms).unwrap();
    }
}
