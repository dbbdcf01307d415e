//! Feedback records and their validated score.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A rating constrained to `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Score(u8);

impl Score {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Result<Self, Error> {
        if (i64::from(Self::MIN)..=i64::from(Self::MAX)).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(Error::InvalidInput(format!(
                "score must be between {} and {}, got {value}",
                Self::MIN,
                Self::MAX
            )))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl FromStr for Score {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: i64 = s
            .trim()
            .parse()
            .map_err(|_| Error::InvalidInput(format!("score must be a number, got {s:?}")))?;
        Self::new(value)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One row of the store.
///
/// Identity is the `(subject, category)` pair compared case-insensitively;
/// `score` and `annotation` are the mutable payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedbackRecord {
    pub subject: String,
    pub category: String,
    pub score: Score,
    pub annotation: String,
}

impl FeedbackRecord {
    pub fn new(
        subject: impl Into<String>,
        category: impl Into<String>,
        score: Score,
        annotation: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            category: category.into(),
            score,
            annotation: annotation.into(),
        }
    }

    /// Returns true if this record has the same identity key as `(subject, category)`.
    pub fn matches_key(&self, subject: &str, category: &str) -> bool {
        self.subject.to_lowercase() == subject.to_lowercase()
            && self.category.to_lowercase() == category.to_lowercase()
    }
}

impl fmt::Display for FeedbackRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Name: {}, Course: {}, Rating: {}, Comment: {}",
            self.subject, self.category, self.score, self.annotation
        )
    }
}
