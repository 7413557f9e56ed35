//! Exercise identity and remote listings

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one exercise on the remote platform
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Exercise {
    /// Language track the exercise belongs to (e.g. "rust")
    pub track: String,

    /// Exercise slug (e.g. "two-fer")
    pub slug: String,
}

impl Exercise {
    pub fn new(track: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            track: track.into(),
            slug: slug.into(),
        }
    }

    /// Module-style name derived from the slug ("two-fer" -> "two_fer")
    pub fn module_name(&self) -> String {
        self.slug.replace('-', "_")
    }
}

impl fmt::Display for Exercise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.track, self.slug)
    }
}

/// One entry from the remote exercise list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseListing {
    pub slug: String,

    #[serde(default)]
    pub title: String,

    /// Not yet reachable for this account
    #[serde(default)]
    pub locked: bool,

    /// Already solved and marked complete
    #[serde(default)]
    pub completed: bool,

    #[serde(default)]
    pub difficulty: Option<String>,
}

impl ExerciseListing {
    /// Unlocked and not yet completed, so worth attempting
    pub fn available(&self) -> bool {
        !self.locked && !self.completed
    }
}
