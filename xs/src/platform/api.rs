//! JSON API client for the remote platform
//!
//! Token-authenticated endpoints: exercise listings and the grading
//! status of the latest submitted iteration.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::domain::{Exercise, ExerciseListing, RemoteIterationStatus};
use crate::error::SolveError;

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    token: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct ExerciseListResponse {
    exercises: Vec<ApiExercise>,
}

#[derive(Debug, Deserialize)]
struct ApiExercise {
    slug: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    is_unlocked: Option<bool>,
    #[serde(default)]
    is_completed: Option<bool>,
    #[serde(default)]
    difficulty: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TrackExerciseResponse {
    #[serde(default)]
    track_exercise: Option<TrackExercise>,
}

#[derive(Debug, Default, Deserialize)]
struct TrackExercise {
    #[serde(default)]
    latest_iteration: Option<LatestIteration>,
}

#[derive(Debug, Default, Deserialize)]
struct LatestIteration {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    tests_status: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Result<Self, SolveError> {
        let http = Client::builder().timeout(timeout).build().map_err(SolveError::Network)?;
        Ok(Self {
            base_url: base_url.into(),
            token: token.into(),
            http,
        })
    }

    /// List a track's exercises with lock/completion state
    pub async fn exercises(&self, track: &str) -> Result<Vec<ExerciseListing>, SolveError> {
        let url = format!("{}/tracks/{}/exercises", self.base_url, track);
        debug!(%url, "ApiClient::exercises: called");

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(SolveError::Network)?;

        let status = resp.status();
        if status.as_u16() == 429 {
            return Err(SolveError::RateLimited {
                retry_after: retry_after_header(&resp),
            });
        }
        if !status.is_success() {
            return Err(SolveError::InvalidResponse(format!(
                "exercise list request failed with {}",
                status
            )));
        }

        let body: ExerciseListResponse = resp.json().await.map_err(SolveError::Network)?;
        let listings = body
            .exercises
            .into_iter()
            .map(|e| ExerciseListing {
                slug: e.slug,
                title: e.title,
                locked: !e.is_unlocked.unwrap_or(true),
                completed: e.is_completed.unwrap_or(false),
                difficulty: e.difficulty,
            })
            .collect::<Vec<_>>();
        debug!(count = listings.len(), "ApiClient::exercises: parsed listings");
        Ok(listings)
    }

    /// Grading status of the latest submitted iteration. Non-transport
    /// problems (missing iteration, odd payloads) map to Unknown so the
    /// monitor can keep polling.
    pub async fn latest_iteration_status(&self, exercise: &Exercise) -> Result<RemoteIterationStatus, SolveError> {
        let url = format!("{}/tracks/{}/exercises/{}", self.base_url, exercise.track, exercise.slug);
        debug!(%url, "ApiClient::latest_iteration_status: called");

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(SolveError::Network)?;

        if !resp.status().is_success() {
            debug!(status = %resp.status(), "ApiClient::latest_iteration_status: non-success response");
            return Ok(RemoteIterationStatus::Unknown);
        }

        let body: TrackExerciseResponse = match resp.json().await {
            Ok(body) => body,
            Err(e) => {
                debug!(error = %e, "ApiClient::latest_iteration_status: unparseable payload");
                return Ok(RemoteIterationStatus::Unknown);
            }
        };

        Ok(iteration_status_from(&body))
    }
}

fn iteration_status_from(resp: &TrackExerciseResponse) -> RemoteIterationStatus {
    let Some(iteration) = resp.track_exercise.as_ref().and_then(|te| te.latest_iteration.as_ref()) else {
        return RemoteIterationStatus::Unknown;
    };

    let status = iteration
        .tests_status
        .as_deref()
        .or(iteration.status.as_deref())
        .unwrap_or("");

    match status {
        "passed" | "pass" => RemoteIterationStatus::Passed,
        "failed" | "errored" | "exceptioned" => RemoteIterationStatus::Failed,
        _ => RemoteIterationStatus::Pending,
    }
}

fn retry_after_header(resp: &reqwest::Response) -> Option<Duration> {
    resp.headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with(tests_status: Option<&str>, status: Option<&str>) -> TrackExerciseResponse {
        TrackExerciseResponse {
            track_exercise: Some(TrackExercise {
                latest_iteration: Some(LatestIteration {
                    status: status.map(String::from),
                    tests_status: tests_status.map(String::from),
                }),
            }),
        }
    }

    #[test]
    fn test_status_mapping_passed_and_failed() {
        assert_eq!(
            iteration_status_from(&response_with(Some("passed"), None)),
            RemoteIterationStatus::Passed
        );
        assert_eq!(
            iteration_status_from(&response_with(Some("failed"), None)),
            RemoteIterationStatus::Failed
        );
        assert_eq!(
            iteration_status_from(&response_with(Some("errored"), None)),
            RemoteIterationStatus::Failed
        );
    }

    #[test]
    fn test_status_mapping_prefers_tests_status() {
        assert_eq!(
            iteration_status_from(&response_with(Some("passed"), Some("queued"))),
            RemoteIterationStatus::Passed
        );
    }

    #[test]
    fn test_unrecognized_status_is_pending() {
        assert_eq!(
            iteration_status_from(&response_with(Some("queued"), None)),
            RemoteIterationStatus::Pending
        );
    }

    #[test]
    fn test_missing_iteration_is_unknown() {
        assert_eq!(
            iteration_status_from(&TrackExerciseResponse::default()),
            RemoteIterationStatus::Unknown
        );
    }
}
