//! Solution candidates

/// One complete proposed solution for an exercise attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// 1-based attempt number this candidate belongs to
    pub attempt: u32,

    /// Full source text of the proposed solution
    pub source: String,
}

impl Candidate {
    /// First candidate for an exercise
    pub fn initial(source: impl Into<String>) -> Self {
        Self {
            attempt: 1,
            source: source.into(),
        }
    }

    /// Refined candidate replacing this one on the next attempt
    pub fn superseded_by(&self, source: impl Into<String>) -> Self {
        Self {
            attempt: self.attempt + 1,
            source: source.into(),
        }
    }
}
