//! Remote grading monitor
//!
//! After delivery, grading happens asynchronously on the platform.
//! The monitor polls the delivery channel's status view on a fixed
//! schedule, always sleeping before each poll so a just-submitted
//! iteration has a chance to enter the grading queue.

use std::time::Duration;
use tracing::{debug, info};

use crate::config::MonitorConfig;
use crate::delivery::DeliveryChannel;
use crate::domain::{Exercise, RemoteIterationStatus};

pub struct GradingMonitor {
    max_retries: u32,
    retry_delay: Duration,
}

impl GradingMonitor {
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            max_retries,
            retry_delay,
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(config.max_retries, Duration::from_millis(config.retry_delay_ms))
    }

    /// Poll until the latest iteration reaches a terminal state.
    /// Transient failures count against the budget like pending polls;
    /// an exhausted budget yields Timeout.
    pub async fn wait_for_completion(
        &self,
        channel: &dyn DeliveryChannel,
        exercise: &Exercise,
    ) -> RemoteIterationStatus {
        debug!(%exercise, max_retries = self.max_retries, "GradingMonitor::wait_for_completion: called");

        for attempt in 1..=self.max_retries {
            tokio::time::sleep(self.retry_delay).await;

            let status = match channel.query_status(exercise).await {
                Ok(status) => status,
                Err(e) => {
                    debug!(attempt, error = %e, "GradingMonitor::wait_for_completion: status check failed");
                    RemoteIterationStatus::Unknown
                }
            };

            if status.is_terminal() {
                info!(%exercise, %status, attempt, "remote grading reached terminal state");
                return status;
            }
            debug!(%exercise, %status, attempt, max = self.max_retries, "remote grading still in progress");
        }

        info!(%exercise, "remote grading polling budget exhausted");
        RemoteIterationStatus::Timeout
    }
}
