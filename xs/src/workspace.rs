//! Workspace store - on-disk exercise artifacts
//!
//! Materialization is idempotent: an exercise directory that already
//! exists is reused without touching the network.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};

use crate::domain::{Candidate, Exercise};
use crate::error::SolveError;
use crate::platform::SubmissionTool;

/// Everything the solution generator needs to know about one exercise
#[derive(Debug, Clone)]
pub struct ExerciseContext {
    pub exercise: Exercise,

    /// Exercise directory inside the workspace
    pub dir: PathBuf,

    /// File the candidate source is written to
    pub solution_file: PathBuf,

    /// Starter code shipped with the exercise
    pub starter_code: String,

    /// Test suite source, when the layout exposes one
    pub test_code: String,

    /// Exercise instructions (README)
    pub instructions: String,
}

/// Owns the workspace directory tree and fetches exercises into it
pub struct WorkspaceStore {
    root: PathBuf,
    tool: Arc<SubmissionTool>,
}

impl WorkspaceStore {
    pub fn new(root: impl Into<PathBuf>, tool: Arc<SubmissionTool>) -> Self {
        Self {
            root: root.into(),
            tool,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Canonical directory for an exercise: <root>/<track>/<slug>
    pub fn exercise_dir(&self, exercise: &Exercise) -> PathBuf {
        self.root.join(&exercise.track).join(&exercise.slug)
    }

    /// Fetch the exercise unless it is already on disk
    pub async fn materialize(&self, exercise: &Exercise) -> Result<PathBuf, SolveError> {
        debug!(%exercise, "WorkspaceStore::materialize: called");
        let dir = self.exercise_dir(exercise);

        if fs::try_exists(&dir).await.unwrap_or(false) {
            info!(%exercise, dir = %dir.display(), "exercise already materialized, reusing");
            return Ok(dir);
        }

        let downloaded = self.tool.download(exercise).await?;
        let dir = downloaded.unwrap_or(dir);
        info!(%exercise, dir = %dir.display(), "exercise downloaded");
        Ok(dir)
    }

    /// Locate the solution file for the track's layout
    pub async fn solution_file(&self, exercise: &Exercise, dir: &Path) -> Result<PathBuf, SolveError> {
        debug!(%exercise, "WorkspaceStore::solution_file: called");
        match exercise.track.as_str() {
            "rust" => {
                let lib = dir.join("src").join("lib.rs");
                if fs::try_exists(&lib).await.unwrap_or(false) {
                    return Ok(lib);
                }
                let main = dir.join("src").join("main.rs");
                if fs::try_exists(&main).await.unwrap_or(false) {
                    return Ok(main);
                }
                Err(SolveError::ExerciseUnavailable(format!(
                    "{}: no src/lib.rs or src/main.rs under {}",
                    exercise,
                    dir.display()
                )))
            }
            _ => {
                // C-style layout: first non-test .c file, else the
                // conventional <module>.c name
                if let Some(found) = find_c_solution(dir).await? {
                    return Ok(found);
                }
                Ok(dir.join(format!("{}.c", exercise.module_name())))
            }
        }
    }

    /// Read starter code, tests, and instructions for a materialized exercise
    pub async fn read_context(&self, exercise: &Exercise) -> Result<ExerciseContext, SolveError> {
        debug!(%exercise, "WorkspaceStore::read_context: called");
        let dir = self.exercise_dir(exercise);
        let solution_file = self.solution_file(exercise, &dir).await?;

        let starter_code = read_or_empty(&solution_file).await;
        let test_code = match exercise.track.as_str() {
            "rust" => {
                let test_file = dir.join("tests").join(format!("{}.rs", exercise.module_name()));
                read_or_empty(&test_file).await
            }
            _ => match find_c_test(&dir).await? {
                Some(path) => read_or_empty(&path).await,
                None => String::new(),
            },
        };
        let instructions = {
            let readme = read_or_empty(&dir.join("README.md")).await;
            if readme.is_empty() {
                read_or_empty(&dir.join("HELP.md")).await
            } else {
                readme
            }
        };

        Ok(ExerciseContext {
            exercise: exercise.clone(),
            dir,
            solution_file,
            starter_code,
            test_code,
            instructions,
        })
    }

    /// Overwrite the solution file with a candidate's source
    pub async fn write_candidate(&self, ctx: &ExerciseContext, candidate: &Candidate) -> Result<(), SolveError> {
        debug!(
            exercise = %ctx.exercise,
            attempt = candidate.attempt,
            file = %ctx.solution_file.display(),
            "WorkspaceStore::write_candidate: called"
        );
        if let Some(parent) = ctx.solution_file.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&ctx.solution_file, &candidate.source).await?;
        Ok(())
    }
}

async fn read_or_empty(path: &Path) -> String {
    fs::read_to_string(path).await.unwrap_or_default()
}

async fn find_c_solution(dir: &Path) -> Result<Option<PathBuf>, SolveError> {
    scan_c_files(dir, false).await
}

async fn find_c_test(dir: &Path) -> Result<Option<PathBuf>, SolveError> {
    scan_c_files(dir, true).await
}

async fn scan_c_files(dir: &Path, want_test: bool) -> Result<Option<PathBuf>, SolveError> {
    if !fs::try_exists(dir).await.unwrap_or(false) {
        return Ok(None);
    }
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.ends_with(".c") {
            continue;
        }
        let is_test = name.contains("test");
        if is_test == want_test {
            return Ok(Some(path));
        }
    }
    Ok(None)
}
