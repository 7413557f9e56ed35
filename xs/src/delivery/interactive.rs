//! Interactive delivery through the rendered web editor
//!
//! Sequences the editor operations a human would perform: authenticate,
//! open the exercise, replace the buffer, run the remote tests, poll the
//! result panel, then publish an iteration. Completion bookkeeping
//! (mark complete, harvest newly unlocked exercises) is best-effort.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::DeliveryChannel;
use crate::domain::{Candidate, Exercise, ExerciseListing, RemoteIterationStatus, SubmissionAck};
use crate::error::SolveError;
use crate::platform::{RemoteSession, RemoteTestSummary};
use crate::workspace::ExerciseContext;

pub struct InteractiveChannel {
    session: Arc<dyn RemoteSession>,
    poll_interval: Duration,
    max_polls: u32,

    /// Grace period for a human to finish logging in
    auth_grace: Duration,

    /// No human available; fail instead of waiting
    headless: bool,

    /// Exercises unlocked by the most recent completion, for
    /// progression flows to consume
    unlocked: Mutex<Vec<ExerciseListing>>,
}

impl InteractiveChannel {
    pub fn new(
        session: Arc<dyn RemoteSession>,
        poll_interval: Duration,
        max_polls: u32,
        auth_grace: Duration,
        headless: bool,
    ) -> Self {
        Self {
            session,
            poll_interval,
            max_polls,
            auth_grace,
            headless,
            unlocked: Mutex::new(Vec::new()),
        }
    }

    /// Take the exercises unlocked by the last completed submission
    pub async fn take_unlocked(&self) -> Vec<ExerciseListing> {
        std::mem::take(&mut *self.unlocked.lock().await)
    }

    async fn ensure_authenticated(&self) -> Result<(), SolveError> {
        debug!("InteractiveChannel::ensure_authenticated: called");
        if self.session.is_authenticated().await? {
            return Ok(());
        }

        if self.headless {
            debug!("InteractiveChannel::ensure_authenticated: headless, failing immediately");
            return Err(SolveError::AuthenticationRequired(
                "no session available and headless mode prevents manual login".to_string(),
            ));
        }

        // A human may be mid-login; give them the grace period and check once more
        warn!(
            grace_ms = self.auth_grace.as_millis() as u64,
            "no authenticated session, waiting for manual login"
        );
        tokio::time::sleep(self.auth_grace).await;

        if self.session.is_authenticated().await? {
            info!("InteractiveChannel::ensure_authenticated: manual login completed");
            return Ok(());
        }
        Err(SolveError::AuthenticationRequired(
            "manual login did not complete within the grace period".to_string(),
        ))
    }

    async fn poll_summary(&self, exercise: &Exercise) -> Result<RemoteTestSummary, SolveError> {
        debug!(%exercise, max_polls = self.max_polls, "InteractiveChannel::poll_summary: called");
        for poll in 1..=self.max_polls {
            tokio::time::sleep(self.poll_interval).await;
            if let Some(summary) = self.session.read_test_summary(exercise).await? {
                debug!(poll, passed = summary.passed, failed = summary.failed, "InteractiveChannel::poll_summary: results ready");
                return Ok(summary);
            }
            debug!(poll, "InteractiveChannel::poll_summary: results not ready");
        }
        Err(SolveError::Timeout(self.poll_interval * self.max_polls))
    }

    async fn record_completion(&self, exercise: &Exercise) {
        match self.session.mark_complete(exercise).await {
            Ok(true) => match self.session.unlocked_exercises(&exercise.track).await {
                Ok(unlocked) => {
                    info!(%exercise, count = unlocked.len(), "exercise completed, harvested unlocked exercises");
                    *self.unlocked.lock().await = unlocked;
                }
                Err(e) => debug!(error = %e, "could not harvest unlocked exercises"),
            },
            Ok(false) => debug!(%exercise, "platform declined to mark exercise complete"),
            Err(e) => warn!(%exercise, error = %e, "mark complete failed"),
        }
    }
}

#[async_trait::async_trait]
impl DeliveryChannel for InteractiveChannel {
    async fn submit(&self, candidate: &Candidate, ctx: &ExerciseContext) -> Result<SubmissionAck, SolveError> {
        debug!(exercise = %ctx.exercise, attempt = candidate.attempt, "InteractiveChannel::submit: called");
        self.ensure_authenticated().await?;

        let exercise = &ctx.exercise;
        self.session.open_exercise(exercise).await?;
        self.session.replace_editor_content(exercise, &candidate.source).await?;
        self.session.run_tests(exercise).await?;

        let summary = self.poll_summary(exercise).await?;
        if !summary.all_passed() {
            return Err(SolveError::Delivery(format!(
                "remote editor tests failed: {}/{} passed",
                summary.passed,
                summary.passed + summary.failed
            )));
        }

        let reference = self.session.submit_iteration(exercise).await?;
        info!(%exercise, %reference, "iteration submitted");

        // The submission already succeeded; completion follow-ups must
        // not fail it
        self.record_completion(exercise).await;

        Ok(SubmissionAck::Accepted { detail: reference })
    }

    async fn query_status(&self, exercise: &Exercise) -> Result<RemoteIterationStatus, SolveError> {
        debug!(%exercise, "InteractiveChannel::query_status: called");
        match self.session.read_test_summary(exercise).await? {
            Some(summary) if summary.all_passed() => Ok(RemoteIterationStatus::Passed),
            Some(_) => Ok(RemoteIterationStatus::Failed),
            None => Ok(RemoteIterationStatus::Pending),
        }
    }
}
