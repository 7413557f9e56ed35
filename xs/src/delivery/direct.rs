//! Direct delivery through the local submission tool

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::DeliveryChannel;
use crate::domain::{Candidate, Exercise, RemoteIterationStatus, SubmissionAck};
use crate::error::SolveError;
use crate::platform::{ApiClient, SubmissionTool, ToolOutput, is_rate_limited_output, parse_retry_after, parse_status_output};
use crate::workspace::ExerciseContext;

pub struct DirectChannel {
    tool: Arc<SubmissionTool>,
    api: ApiClient,

    /// Wait applied when a rate-limit response names no interval
    rate_limit_backoff: Duration,
}

impl DirectChannel {
    pub fn new(tool: Arc<SubmissionTool>, api: ApiClient, rate_limit_backoff: Duration) -> Self {
        Self {
            tool,
            api,
            rate_limit_backoff,
        }
    }

    fn interpret(out: &ToolOutput) -> Interpretation {
        let combined = out.combined();
        if is_no_changes(&combined) {
            return Interpretation::AlreadySubmitted;
        }
        if out.exit_code == 0 {
            return Interpretation::Accepted(combined.trim().to_string());
        }
        if is_rate_limited_output(&combined) {
            return Interpretation::RateLimited(parse_retry_after(&combined));
        }
        Interpretation::Failed(first_line(&combined))
    }
}

enum Interpretation {
    Accepted(String),
    AlreadySubmitted,
    RateLimited(Option<Duration>),
    Failed(String),
}

#[async_trait::async_trait]
impl DeliveryChannel for DirectChannel {
    async fn submit(&self, candidate: &Candidate, ctx: &ExerciseContext) -> Result<SubmissionAck, SolveError> {
        debug!(exercise = %ctx.exercise, attempt = candidate.attempt, "DirectChannel::submit: called");

        let out = self.tool.submit(&ctx.solution_file).await?;
        match Self::interpret(&out) {
            Interpretation::Accepted(detail) => {
                info!(exercise = %ctx.exercise, "DirectChannel::submit: accepted");
                return Ok(SubmissionAck::Accepted { detail });
            }
            Interpretation::AlreadySubmitted => {
                info!(exercise = %ctx.exercise, "DirectChannel::submit: no changes since last submission");
                return Ok(SubmissionAck::AlreadySubmitted);
            }
            Interpretation::Failed(reason) => {
                return Err(SolveError::Delivery(reason));
            }
            Interpretation::RateLimited(suggested) => {
                // One bounded retry after the suggested (or fallback) wait
                let wait = suggested.unwrap_or(self.rate_limit_backoff);
                warn!(exercise = %ctx.exercise, wait_ms = wait.as_millis() as u64, "DirectChannel::submit: rate limited, retrying once");
                tokio::time::sleep(wait).await;
            }
        }

        let out = self.tool.submit(&ctx.solution_file).await?;
        match Self::interpret(&out) {
            Interpretation::Accepted(detail) => Ok(SubmissionAck::Accepted { detail }),
            Interpretation::AlreadySubmitted => Ok(SubmissionAck::AlreadySubmitted),
            Interpretation::RateLimited(retry_after) => Err(SolveError::RateLimited { retry_after }),
            Interpretation::Failed(reason) => Err(SolveError::Delivery(reason)),
        }
    }

    async fn query_status(&self, exercise: &Exercise) -> Result<RemoteIterationStatus, SolveError> {
        debug!(%exercise, "DirectChannel::query_status: called");

        // Tool first: it sees the same credentials the submission used
        match self.tool.status(exercise).await {
            Ok(out) if out.exit_code == 0 => {
                if let Some(status) = parse_status_output(&out.combined()) {
                    debug!(%exercise, %status, "DirectChannel::query_status: tool reported status");
                    return Ok(status);
                }
                debug!(%exercise, "DirectChannel::query_status: tool output unrecognized, trying API");
            }
            Ok(out) => {
                debug!(%exercise, exit_code = out.exit_code, "DirectChannel::query_status: tool status failed, trying API");
            }
            Err(e) => {
                debug!(%exercise, error = %e, "DirectChannel::query_status: tool unavailable, trying API");
            }
        }

        match self.api.latest_iteration_status(exercise).await {
            Ok(status) => Ok(status),
            Err(e) => {
                // Transient API trouble must not end the monitor's polling
                debug!(error = %e, "DirectChannel::query_status: API failed, reporting unknown");
                Ok(RemoteIterationStatus::Unknown)
            }
        }
    }
}

/// Check tool output for the "nothing changed" submission response
fn is_no_changes(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("no files you submitted have changed") || lower.contains("no changes")
}

fn first_line(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("submission tool produced no output")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;

    fn out(exit_code: i32, stdout: &str) -> ToolOutput {
        ToolOutput {
            exit_code,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    #[test]
    fn test_no_changes_detection() {
        assert!(is_no_changes("No files you submitted have changed since your last submission."));
        assert!(is_no_changes("Error: no changes detected"));
        assert!(!is_no_changes("Your solution has been submitted."));
    }

    #[test]
    fn test_interpret_accepted() {
        let interpretation = DirectChannel::interpret(&out(0, "Your solution has been submitted."));
        assert!(matches!(interpretation, Interpretation::Accepted(_)));
    }

    #[test]
    fn test_interpret_no_changes_beats_exit_code() {
        // The tool exits non-zero for the no-changes case; it is still terminal
        let interpretation = DirectChannel::interpret(&out(1, "No files you submitted have changed"));
        assert!(matches!(interpretation, Interpretation::AlreadySubmitted));
    }

    #[test]
    fn test_interpret_rate_limit_with_wait() {
        let interpretation = DirectChannel::interpret(&out(1, "rate limit exceeded, try again in 3 seconds"));
        match interpretation {
            Interpretation::RateLimited(wait) => assert_eq!(wait, Some(Duration::from_secs(3))),
            _ => panic!("expected rate limit interpretation"),
        }
    }

    #[test]
    fn test_interpret_other_failure() {
        let interpretation = DirectChannel::interpret(&out(1, "Error: solution file not found"));
        assert!(matches!(interpretation, Interpretation::Failed(_)));
    }

    async fn channel_with_script(dir: &Path, script_body: &str) -> (DirectChannel, ExerciseContext) {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.join("fake-tool.sh");
        std::fs::write(&script, script_body).unwrap();
        let mut perms = std::fs::metadata(&script).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&script, perms).unwrap();

        let tool = Arc::new(SubmissionTool::new(&script, "tok", dir, Duration::from_secs(5)));
        let api = ApiClient::new("http://127.0.0.1:1", "tok", Duration::from_millis(200)).unwrap();
        let channel = DirectChannel::new(tool, api, Duration::from_millis(10));

        let solution_file = dir.join("lib.rs");
        std::fs::write(&solution_file, "// candidate\n").unwrap();
        let ctx = ExerciseContext {
            exercise: crate::domain::Exercise::new("rust", "leap"),
            dir: dir.to_path_buf(),
            solution_file,
            starter_code: String::new(),
            test_code: String::new(),
            instructions: String::new(),
        };
        (channel, ctx)
    }

    #[tokio::test]
    async fn test_submit_accepted_end_to_end() {
        let temp = tempdir().unwrap();
        let (channel, ctx) = channel_with_script(temp.path(), "#!/bin/sh\necho 'Submitted.'\n").await;

        let ack = channel.submit(&Candidate::initial("// x"), &ctx).await.unwrap();
        assert!(matches!(ack, SubmissionAck::Accepted { .. }));
    }

    #[tokio::test]
    async fn test_submit_rate_limit_retries_once_then_succeeds() {
        let temp = tempdir().unwrap();
        // First invocation reports a rate limit; the marker file flips
        // the second invocation to success
        let script = "#!/bin/sh\n\
if [ -f \"$(dirname \"$0\")/ran_once\" ]; then\n\
  echo 'Submitted.'\n\
else\n\
  touch \"$(dirname \"$0\")/ran_once\"\n\
  echo 'rate limit exceeded, try again in 1 seconds' >&2\n\
  exit 1\n\
fi\n";
        let (channel, ctx) = channel_with_script(temp.path(), script).await;

        let ack = channel.submit(&Candidate::initial("// x"), &ctx).await.unwrap();
        assert!(matches!(ack, SubmissionAck::Accepted { .. }));
    }

    #[tokio::test]
    async fn test_submit_persistent_rate_limit_errors() {
        let temp = tempdir().unwrap();
        let script = "#!/bin/sh\necho 'rate limit exceeded, try again in 1 seconds' >&2\nexit 1\n";
        let (channel, ctx) = channel_with_script(temp.path(), script).await;

        let err = channel.submit(&Candidate::initial("// x"), &ctx).await.unwrap_err();
        assert!(err.is_rate_limited());
    }

    #[tokio::test]
    async fn test_query_status_prefers_tool_output() {
        let temp = tempdir().unwrap();
        // The API endpoint is unreachable; only the tool can answer
        let (channel, ctx) = channel_with_script(temp.path(), "#!/bin/sh\necho 'Status: completed'\n").await;

        let status = channel.query_status(&ctx.exercise).await.unwrap();
        assert_eq!(status, RemoteIterationStatus::Passed);
    }

    #[tokio::test]
    async fn test_query_status_tool_failure_falls_back_to_api() {
        let temp = tempdir().unwrap();
        let (channel, ctx) = channel_with_script(temp.path(), "#!/bin/sh\nexit 1\n").await;

        // Tool errors and the API is unreachable: status is unknown, not an error
        let status = channel.query_status(&ctx.exercise).await.unwrap();
        assert_eq!(status, RemoteIterationStatus::Unknown);
    }

    #[tokio::test]
    async fn test_query_status_unrecognized_tool_output_is_unknown() {
        let temp = tempdir().unwrap();
        let (channel, ctx) = channel_with_script(temp.path(), "#!/bin/sh\ntrue\n").await;

        let status = channel.query_status(&ctx.exercise).await.unwrap();
        assert_eq!(status, RemoteIterationStatus::Unknown);
    }
}
