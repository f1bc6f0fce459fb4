//! Turns what was shown and what was typed into a [`TypingResult`].

use crate::error::{Result, ScoreError};
use crate::levenshtein::{edit_distance, expect_text};
use crate::result::{TypingResult, TIMESTAMP_FORMAT};
use chrono::{DateTime, Duration, Local};
use serde_json::Value;
use tracing::{debug, warn};

/// Everything the calculator needs about one finished test.
#[derive(Debug, Clone)]
pub struct ScoreRequest {
    /// Reference text shown, sentences joined by `\n`.
    pub given_text: String,
    /// What the user entered, already trimmed by the caller.
    pub typed_text: String,
    /// Printable keystrokes counted while typing; `None` if no key was pressed.
    pub typed_character_count: Option<usize>,
    pub start_time: DateTime<Local>,
    pub end_time: DateTime<Local>,
    pub user_name: String,
}

/// Score a finished test.
///
/// The reference is cut to the first `typed_character_count` characters
/// before comparing, so text displayed but never attempted does not count
/// against the user.
pub fn score(request: &ScoreRequest) -> Result<TypingResult> {
    let count = match request.typed_character_count {
        Some(count) if count > 0 => count,
        _ => {
            warn!(user = %request.user_name, "nothing typed, no result produced");
            return Err(ScoreError::NothingTyped);
        }
    };

    if request.end_time < request.start_time {
        return Err(ScoreError::InvalidTimeRange {
            start: request.start_time,
            end: request.end_time,
        });
    }

    let window = comparison_window(&request.given_text, count);
    let distance = edit_distance(window, &request.typed_text);
    debug!(
        window = ?window,
        typed = ?request.typed_text,
        edit_distance = distance,
        "compared typed text"
    );

    let duration_seconds = (request.end_time - request.start_time).num_seconds();
    if duration_seconds == 0 {
        warn!(user = %request.user_name, "test finished in under a second, speed reported as 0");
    }
    let words = count_words(&request.typed_text);

    Ok(TypingResult {
        user_name: request.user_name.clone(),
        start_time: request.start_time,
        end_time: request.end_time,
        duration_seconds,
        edit_distance: distance,
        accuracy_percent: accuracy_percent(count, distance),
        words,
        words_per_minute: words_per_minute(words, duration_seconds),
        timestamp: request.end_time.format(TIMESTAMP_FORMAT).to_string(),
        given_text: request.given_text.clone(),
        typed_text: request.typed_text.clone(),
    })
}

/// The first `count` characters of `given`, cut on a char boundary.
pub fn comparison_window(given: &str, count: usize) -> &str {
    match given.char_indices().nth(count) {
        Some((end, _)) => &given[..end],
        None => given,
    }
}

/// Truncated toward zero; negative when `distance > count`.
pub fn accuracy_percent(count: usize, distance: usize) -> i64 {
    if count == 0 {
        return 0;
    }
    ((count as f64 - distance as f64) / count as f64 * 100.0) as i64
}

/// Tokens from splitting on single spaces. Runs of spaces produce empty
/// tokens and those are counted too.
pub fn count_words(typed: &str) -> usize {
    typed.split(' ').count()
}

/// Whole words per minute, or 0 for a test shorter than one second.
pub fn words_per_minute(words: usize, duration_seconds: i64) -> i64 {
    if duration_seconds <= 0 {
        return 0;
    }
    (words as f64 / (duration_seconds as f64 / 60.0)).floor() as i64
}

/// `start_time` moved `seconds` forward, or an error when that leaves
/// chrono's representable range.
pub fn end_after(start_time: DateTime<Local>, seconds: i64) -> Result<DateTime<Local>> {
    Duration::try_seconds(seconds)
        .and_then(|length| start_time.checked_add_signed(length))
        .ok_or(ScoreError::DurationOutOfRange { seconds })
}

/// `end_time` moved `seconds` back; the counterpart of [`end_after`].
pub fn start_before(end_time: DateTime<Local>, seconds: i64) -> Result<DateTime<Local>> {
    Duration::try_seconds(seconds)
        .and_then(|length| end_time.checked_sub_signed(length))
        .ok_or(ScoreError::DurationOutOfRange { seconds })
}

/// Score a JSON array of recorded attempts.
///
/// Each entry carries `given_text`, `typed_text`, `typed_character_count`,
/// `duration_seconds` and optionally `user_name`. Entries are anchored at
/// `start_time`. A malformed document is an error; a bad entry only fails
/// its own slot.
pub fn score_batch_json(
    json: &str,
    start_time: DateTime<Local>,
) -> serde_json::Result<Vec<Result<TypingResult>>> {
    let entries: Vec<Value> = serde_json::from_str(json)?;
    Ok(entries
        .iter()
        .map(|entry| score_batch_entry(entry, start_time))
        .collect())
}

fn score_batch_entry(entry: &Value, start_time: DateTime<Local>) -> Result<TypingResult> {
    let given = expect_text("given_text", entry.get("given_text").unwrap_or(&Value::Null))?;
    let typed = expect_text("typed_text", entry.get("typed_text").unwrap_or(&Value::Null))?;
    let typed_character_count = entry
        .get("typed_character_count")
        .and_then(Value::as_u64)
        .map(|n| n as usize);
    let seconds = entry
        .get("duration_seconds")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    let user_name = entry
        .get("user_name")
        .and_then(Value::as_str)
        .unwrap_or("Unknown");

    score(&ScoreRequest {
        given_text: given.to_string(),
        typed_text: typed.trim().to_string(),
        typed_character_count,
        start_time,
        end_time: end_after(start_time, seconds)?,
        user_name: user_name.to_string(),
    })
}
