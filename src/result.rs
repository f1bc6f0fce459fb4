use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt;

/// Format used for the human readable `timestamp` column.
pub const TIMESTAMP_FORMAT: &str = "%m/%d/%y %I:%M %p";

/// Outcome of one completed typing test.
///
/// Built once by [`crate::score::score`] and never changed afterwards;
/// fields are read through accessors only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypingResult {
    pub(crate) user_name: String,
    pub(crate) start_time: DateTime<Local>,
    pub(crate) end_time: DateTime<Local>,
    pub(crate) duration_seconds: i64,
    pub(crate) edit_distance: usize,
    pub(crate) accuracy_percent: i64,
    pub(crate) words: usize,
    pub(crate) words_per_minute: i64,
    pub(crate) timestamp: String,
    pub(crate) given_text: String,
    pub(crate) typed_text: String,
}

impl TypingResult {
    pub fn user_name(&self) -> &str {
        &self.user_name
    }

    pub fn start_time(&self) -> DateTime<Local> {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime<Local> {
        self.end_time
    }

    pub fn duration_seconds(&self) -> i64 {
        self.duration_seconds
    }

    pub fn edit_distance(&self) -> usize {
        self.edit_distance
    }

    /// Raw accuracy. Negative when the edit distance exceeds the number
    /// of characters attempted.
    pub fn accuracy_percent(&self) -> i64 {
        self.accuracy_percent
    }

    /// Accuracy limited to `0..=100` for display.
    pub fn clamped_accuracy(&self) -> i64 {
        self.accuracy_percent.clamp(0, 100)
    }

    pub fn words(&self) -> usize {
        self.words
    }

    pub fn words_per_minute(&self) -> i64 {
        self.words_per_minute
    }

    /// End time rendered with [`TIMESTAMP_FORMAT`].
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn given_text(&self) -> &str {
        &self.given_text
    }

    pub fn typed_text(&self) -> &str {
        &self.typed_text
    }
}

impl fmt::Display for TypingResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Accuracy: {}%", self.accuracy_percent)?;
        writeln!(f, "Speed: {} WPM", self.words_per_minute)?;
        writeln!(f, "Duration: {} seconds", self.duration_seconds)?;
        writeln!(f, "Words: {}", self.words)?;
        writeln!(f, "Edit distance: {}", self.edit_distance)?;
        writeln!(f, "User: {}", self.user_name)?;
        writeln!(f, "Timestamp: {}", self.timestamp)?;
        writeln!(f, "Given text:\n{}\n", self.given_text)?;
        writeln!(f, "Typed text:\n{}", self.typed_text)
    }
}

/// A result as kept in the history database.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredResult {
    pub id: i64,
    pub result: TypingResult,
}

impl fmt::Display for StoredResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "id: {}", self.id)?;
        write!(f, "{}", self.result)
    }
}
