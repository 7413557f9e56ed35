//! Persisted login session and the rendered-web session capability
//!
//! The interactive channel drives the remote editor through the
//! `RemoteSession` trait; selector maintenance and the login flow live
//! behind it. Sessions persist as a JSON cookie record that is read at
//! startup and overwritten after each successful authentication check.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::domain::{Exercise, ExerciseListing};
use crate::error::SolveError;

/// One browser cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default = "default_cookie_path")]
    pub path: String,
}

fn default_cookie_path() -> String {
    "/".to_string()
}

/// Persisted authenticated-session record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub cookies: Vec<SessionCookie>,
    pub saved_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(cookies: Vec<SessionCookie>) -> Self {
        Self {
            cookies,
            saved_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Cookie header value for HTTP requests carrying this session
    pub fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Load/save for the process-wide session record
pub trait SessionStore: Send + Sync {
    /// Absent or unreadable sessions are non-fatal; they just mean
    /// authentication has to happen again
    fn load(&self) -> Option<SessionRecord>;

    fn save(&self, record: &SessionRecord) -> Result<(), SolveError>;
}

/// JSON file at a fixed, well-known location
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("exsolver")
            .join("session.json")
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Option<SessionRecord> {
        debug!(path = %self.path.display(), "FileSessionStore::load: called");
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!(error = %e, "FileSessionStore::load: no readable session file");
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(error = %e, "FileSessionStore::load: corrupt session file, ignoring");
                None
            }
        }
    }

    fn save(&self, record: &SessionRecord) -> Result<(), SolveError> {
        debug!(path = %self.path.display(), "FileSessionStore::save: called");
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| SolveError::InvalidResponse(format!("session serialization failed: {}", e)))?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// Summary read from the remote editor's rendered test panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteTestSummary {
    pub passed: u32,
    pub failed: u32,
}

impl RemoteTestSummary {
    /// Mirrors local verification: zero observed tests is not a pass
    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.passed > 0
    }
}

/// Opaque rendered-web session the interactive channel drives
///
/// Operations are sequenced by the channel; how each one is realized
/// (page navigation, editor widgets, result panels) stays behind this
/// trait.
#[async_trait]
pub trait RemoteSession: Send + Sync {
    async fn is_authenticated(&self) -> Result<bool, SolveError>;

    /// Navigate to the exercise's editor
    async fn open_exercise(&self, exercise: &Exercise) -> Result<(), SolveError>;

    /// Replace the editor buffer with candidate source
    async fn replace_editor_content(&self, exercise: &Exercise, source: &str) -> Result<(), SolveError>;

    /// Trigger the remote test run for the current buffer
    async fn run_tests(&self, exercise: &Exercise) -> Result<(), SolveError>;

    /// Read the test panel; None while results are still materializing
    async fn read_test_summary(&self, exercise: &Exercise) -> Result<Option<RemoteTestSummary>, SolveError>;

    /// Submit the current buffer as an iteration; returns a reference
    /// to the created iteration (URL or identifier)
    async fn submit_iteration(&self, exercise: &Exercise) -> Result<String, SolveError>;

    /// Mark the exercise complete; false when the platform refused
    async fn mark_complete(&self, exercise: &Exercise) -> Result<bool, SolveError>;

    /// Exercises currently unlocked on the track
    async fn unlocked_exercises(&self, track: &str) -> Result<Vec<ExerciseListing>, SolveError>;
}


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_record() -> SessionRecord {
        SessionRecord::new(vec![
            SessionCookie {
                name: "_session_id".to_string(),
                value: "abc123".to_string(),
                domain: "example.org".to_string(),
                path: "/".to_string(),
            },
            SessionCookie {
                name: "remember_token".to_string(),
                value: "xyz".to_string(),
                domain: "example.org".to_string(),
                path: "/".to_string(),
            },
        ])
    }

    #[test]
    fn test_cookie_header_joins_pairs() {
        let record = sample_record();
        assert_eq!(record.cookie_header(), "_session_id=abc123; remember_token=xyz");
    }

    #[test]
    fn test_file_store_roundtrip() {
        let temp = tempdir().unwrap();
        let store = FileSessionStore::new(temp.path().join("session.json"));

        let record = sample_record();
        store.save(&record).unwrap();

        let loaded = store.load().expect("session should load");
        assert_eq!(loaded.cookies, record.cookies);
    }

    #[test]
    fn test_missing_session_is_none() {
        let temp = tempdir().unwrap();
        let store = FileSessionStore::new(temp.path().join("absent.json"));
        assert!(store.load().is_none());
    }

    #[test]
    fn test_corrupt_session_is_none() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = FileSessionStore::new(path);
        assert!(store.load().is_none());
    }

    #[test]
    fn test_summary_all_passed_needs_tests() {
        assert!(RemoteTestSummary { passed: 3, failed: 0 }.all_passed());
        assert!(!RemoteTestSummary { passed: 0, failed: 0 }.all_passed());
        assert!(!RemoteTestSummary { passed: 2, failed: 1 }.all_passed());
    }
}
