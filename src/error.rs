//! Errors raised while scoring a typing test.

use chrono::{DateTime, Local};
use thiserror::Error;

/// Result type alias for scoring operations.
pub type Result<T> = std::result::Result<T, ScoreError>;

#[derive(Debug, Error, PartialEq)]
pub enum ScoreError {
    /// The user ended the test without typing a single printable character.
    #[error("nothing typed, test cancelled")]
    NothingTyped,

    /// A comparison argument was not text.
    #[error("argument `{argument}` must be text, found {found}")]
    NotText {
        argument: &'static str,
        found: &'static str,
    },

    /// The test ended before it started.
    #[error("end time {end} is before start time {start}")]
    InvalidTimeRange {
        start: DateTime<Local>,
        end: DateTime<Local>,
    },

    /// A test length that cannot be placed on the calendar.
    #[error("duration of {seconds} seconds is out of range")]
    DurationOutOfRange { seconds: i64 },
}

impl ScoreError {
    /// Whether the caller should tell the user and move on instead of failing.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ScoreError::NothingTyped)
    }
}
