//! End-to-end pipeline tests with scripted collaborators
//!
//! Exercises the public API the way the binary wires it together: a real
//! workspace on disk, a real harness running shell commands, and
//! scripted generator/channel implementations standing in for the
//! remote platform.

use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::tempdir;

use exsolver::delivery::DeliveryChannel;
use exsolver::domain::{Candidate, Exercise, RemoteIterationStatus, SubmissionAck, VerificationReport};
use exsolver::error::SolveError;
use exsolver::generator::SolutionGenerator;
use exsolver::harness::TestHarness;
use exsolver::monitor::GradingMonitor;
use exsolver::platform::SubmissionTool;
use exsolver::solve::{EngineConfig, SolveEngine};
use exsolver::track::ReportFormat;
use exsolver::workspace::{ExerciseContext, WorkspaceStore};

/// Generator that always returns the same source
struct FixedGenerator {
    source: String,
}

#[async_trait]
impl SolutionGenerator for FixedGenerator {
    async fn generate(&self, _ctx: &ExerciseContext) -> Candidate {
        Candidate::initial(self.source.clone())
    }

    async fn improve(&self, prior: &Candidate, _report: &VerificationReport, _ctx: &ExerciseContext) -> Candidate {
        prior.superseded_by(self.source.clone())
    }
}

/// Channel that counts submissions and replays scripted statuses
struct CountingChannel {
    submits: AtomicUsize,
    statuses: Mutex<Vec<RemoteIterationStatus>>,
}

impl CountingChannel {
    fn new(statuses: Vec<RemoteIterationStatus>) -> Self {
        Self {
            submits: AtomicUsize::new(0),
            statuses: Mutex::new(statuses),
        }
    }

    fn submit_count(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeliveryChannel for CountingChannel {
    async fn submit(&self, candidate: &Candidate, _ctx: &ExerciseContext) -> Result<SubmissionAck, SolveError> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        Ok(SubmissionAck::Accepted {
            detail: format!("attempt {}", candidate.attempt),
        })
    }

    async fn query_status(&self, _exercise: &Exercise) -> Result<RemoteIterationStatus, SolveError> {
        let mut statuses = self.statuses.lock().unwrap();
        if statuses.is_empty() {
            Ok(RemoteIterationStatus::Passed)
        } else {
            Ok(statuses.remove(0))
        }
    }
}

async fn seed_exercise(root: &Path, slug: &str) -> Exercise {
    let dir = root.join("rust").join(slug);
    tokio::fs::create_dir_all(dir.join("src")).await.unwrap();
    tokio::fs::write(dir.join("src").join("lib.rs"), "// starter\n").await.unwrap();
    tokio::fs::write(dir.join("README.md"), "# Instructions\n").await.unwrap();
    Exercise::new("rust", slug)
}

fn build_engine(
    root: &Path,
    harness_command: &str,
    generator: Arc<dyn SolutionGenerator>,
    channel: Arc<dyn DeliveryChannel>,
    max_attempts: u32,
) -> SolveEngine {
    let tool = Arc::new(SubmissionTool::new(
        "/nonexistent/tool",
        "tok",
        root,
        Duration::from_secs(1),
    ));
    SolveEngine::new(
        WorkspaceStore::new(root, tool),
        generator,
        TestHarness::new(harness_command, ReportFormat::Cargo, Duration::from_secs(10)),
        channel,
        GradingMonitor::new(5, Duration::from_millis(1)),
        EngineConfig {
            max_attempts,
            acquisition_retries: 1,
            acquisition_backoff: Duration::from_millis(1),
        },
    )
}

#[tokio::test]
async fn test_full_pipeline_solves_and_confirms_remote_grading() {
    let temp = tempdir().unwrap();
    let exercise = seed_exercise(temp.path(), "leap").await;

    let generator = Arc::new(FixedGenerator {
        source: "pub fn is_leap_year(year: u64) -> bool { year % 4 == 0 }\n".to_string(),
    });
    let channel = Arc::new(CountingChannel::new(vec![
        RemoteIterationStatus::Pending,
        RemoteIterationStatus::Passed,
    ]));

    let engine = build_engine(
        temp.path(),
        "echo 'test result: ok. 3 passed; 0 failed; 0 ignored'",
        generator,
        channel.clone(),
        3,
    );

    let outcome = engine.solve(&exercise).await.unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.attempts, 1);
    assert_eq!(outcome.remote_status, Some(RemoteIterationStatus::Passed));
    assert!(matches!(outcome.submission, Some(SubmissionAck::Accepted { .. })));
    assert_eq!(channel.submit_count(), 1);

    // The candidate landed in the workspace solution file
    let written = tokio::fs::read_to_string(temp.path().join("rust").join("leap").join("src").join("lib.rs"))
        .await
        .unwrap();
    assert!(written.contains("is_leap_year"));
}

#[tokio::test]
async fn test_failing_candidate_is_never_delivered() {
    let temp = tempdir().unwrap();
    let exercise = seed_exercise(temp.path(), "two-fer").await;

    let generator = Arc::new(FixedGenerator {
        source: "// broken\n".to_string(),
    });
    let channel = Arc::new(CountingChannel::new(vec![]));

    let engine = build_engine(
        temp.path(),
        "echo 'test result: FAILED. 0 passed; 2 failed; 0 ignored'",
        generator,
        channel.clone(),
        2,
    );

    let outcome = engine.solve(&exercise).await.unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.attempts, 2);
    assert!(outcome.submission.is_none());
    assert!(outcome.remote_status.is_none());
    assert_eq!(channel.submit_count(), 0);
}

#[tokio::test]
async fn test_remote_timeout_still_reports_local_success() {
    let temp = tempdir().unwrap();
    let exercise = seed_exercise(temp.path(), "raindrops").await;

    let generator = Arc::new(FixedGenerator {
        source: "// fine\n".to_string(),
    });
    // Never reaches a terminal state within the 5-poll budget
    let channel = Arc::new(CountingChannel::new(vec![RemoteIterationStatus::Pending; 20]));

    let engine = build_engine(
        temp.path(),
        "echo 'test result: ok. 1 passed; 0 failed; 0 ignored'",
        generator,
        channel.clone(),
        1,
    );

    let outcome = engine.solve(&exercise).await.unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.remote_status, Some(RemoteIterationStatus::Timeout));
    assert_eq!(channel.submit_count(), 1);
}

#[tokio::test]
async fn test_materialize_is_idempotent_across_solves() {
    let temp = tempdir().unwrap();
    let exercise = seed_exercise(temp.path(), "gigasecond").await;

    let generator = Arc::new(FixedGenerator {
        source: "// v\n".to_string(),
    });
    let channel = Arc::new(CountingChannel::new(vec![]));

    let engine = build_engine(
        temp.path(),
        "echo 'test result: ok. 1 passed; 0 failed; 0 ignored'",
        generator,
        channel,
        1,
    );

    // The workspace tool cannot run; a second solve only works because
    // materialization reuses the directory instead of fetching
    let first = engine.solve(&exercise).await.unwrap();
    let second = engine.solve(&exercise).await.unwrap();

    assert!(first.success);
    assert!(second.success);
}
