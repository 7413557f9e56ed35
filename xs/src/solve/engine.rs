//! Solve orchestrator engine
//!
//! Drives one exercise end to end: acquire the workspace artifact,
//! generate a candidate, verify it locally, refine on failure, deliver
//! once verification passes, then confirm remote grading. Candidates
//! that never pass locally are never delivered.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::SolveConfig;
use crate::delivery::DeliveryChannel;
use crate::domain::{Exercise, RemoteIterationStatus, SolveOutcome, VerificationReport};
use crate::error::SolveError;
use crate::generator::SolutionGenerator;
use crate::harness::TestHarness;
use crate::monitor::GradingMonitor;
use crate::workspace::WorkspaceStore;

/// Attempt and retry bounds for the engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum generate/verify attempts per exercise
    pub max_attempts: u32,

    /// Workspace acquisition retries when rate limited
    pub acquisition_retries: u32,

    /// Fallback backoff between acquisition retries
    pub acquisition_backoff: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            acquisition_retries: 3,
            acquisition_backoff: Duration::from_secs(5),
        }
    }
}

impl EngineConfig {
    pub fn from_config(config: &SolveConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            acquisition_retries: config.acquisition_retries,
            acquisition_backoff: Duration::from_millis(config.acquisition_backoff_ms),
        }
    }
}

pub struct SolveEngine {
    workspace: WorkspaceStore,
    generator: Arc<dyn SolutionGenerator>,
    harness: TestHarness,
    channel: Arc<dyn DeliveryChannel>,
    monitor: GradingMonitor,
    config: EngineConfig,
}

impl SolveEngine {
    pub fn new(
        workspace: WorkspaceStore,
        generator: Arc<dyn SolutionGenerator>,
        harness: TestHarness,
        channel: Arc<dyn DeliveryChannel>,
        monitor: GradingMonitor,
        config: EngineConfig,
    ) -> Self {
        Self {
            workspace,
            generator,
            harness,
            channel,
            monitor,
            config,
        }
    }

    /// Solve one exercise end to end
    pub async fn solve(&self, exercise: &Exercise) -> Result<SolveOutcome, SolveError> {
        info!(%exercise, max_attempts = self.config.max_attempts, "starting solve");

        let dir = self.acquire(exercise).await?;
        debug!(%exercise, dir = %dir.display(), "SolveEngine::solve: workspace acquired");
        let ctx = self.workspace.read_context(exercise).await?;

        let mut candidate = self.generator.generate(&ctx).await;
        let mut last_report = VerificationReport::default();
        let mut attempts = 0u32;
        let mut verified = false;

        while attempts < self.config.max_attempts {
            attempts += 1;
            info!(%exercise, attempt = attempts, max = self.config.max_attempts, "verification attempt");

            self.workspace.write_candidate(&ctx, &candidate).await?;
            let report = self.harness.run(&ctx.dir).await?;
            info!(
                %exercise,
                attempt = attempts,
                passed = report.passed_count,
                total = report.total_count(),
                "verification finished"
            );

            let passed = report.all_passed();
            last_report = report;
            if passed {
                verified = true;
                break;
            }

            // Refine only when another attempt will actually run
            if attempts < self.config.max_attempts {
                debug!(%exercise, "SolveEngine::solve: requesting refined candidate");
                candidate = self.generator.improve(&candidate, &last_report, &ctx).await;
            }
        }

        if !verified {
            info!(%exercise, attempts, "attempt budget exhausted without a passing report, skipping delivery");
            return Ok(SolveOutcome {
                success: false,
                attempts,
                last_candidate: candidate,
                last_report,
                submission: None,
                remote_status: None,
            });
        }

        let ack = self.channel.submit(&candidate, &ctx).await?;
        info!(%exercise, ?ack, "candidate delivered");

        let remote_status = self.monitor.wait_for_completion(self.channel.as_ref(), exercise).await;
        if remote_status == RemoteIterationStatus::Timeout {
            warn!(%exercise, "remote grading did not resolve; local verification stands");
        }

        Ok(SolveOutcome {
            success: true,
            attempts,
            last_candidate: candidate,
            last_report,
            submission: Some(ack),
            remote_status: Some(remote_status),
        })
    }

    /// Materialize the exercise, retrying rate-limited fetches with
    /// bounded backoff
    async fn acquire(&self, exercise: &Exercise) -> Result<PathBuf, SolveError> {
        debug!(%exercise, "SolveEngine::acquire: called");
        let mut retries = 0u32;
        loop {
            match self.workspace.materialize(exercise).await {
                Ok(dir) => return Ok(dir),
                Err(e) if e.is_rate_limited() && retries < self.config.acquisition_retries => {
                    retries += 1;
                    let wait = e.retry_after().unwrap_or(self.config.acquisition_backoff);
                    warn!(
                        %exercise,
                        retry = retries,
                        max = self.config.acquisition_retries,
                        wait_ms = wait.as_millis() as u64,
                        "acquisition rate limited, backing off"
                    );
                    tokio::time::sleep(wait).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
