//! Levenshtein edit distance between two sequences.

use crate::error::ScoreError;
use serde_json::Value;

/// Minimum number of single-character insertions, deletions or
/// substitutions needed to turn `a` into `b`. Compares Unicode scalar
/// values, so multi-byte characters count as one edit.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    distance(&a, &b)
}

/// Edit distance over arbitrary comparable items.
///
/// Keeps a single row sized to the shorter input, so memory is
/// `O(min(a, b))` while time stays `O(a * b)`.
pub fn distance<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    let (shorter, longer) = if a.len() > b.len() { (b, a) } else { (a, b) };

    let mut row: Vec<usize> = (0..=shorter.len()).collect();

    for (i, long_item) in longer.iter().enumerate() {
        let mut next = Vec::with_capacity(shorter.len() + 1);
        next.push(i + 1);

        for (j, short_item) in shorter.iter().enumerate() {
            let cost = if short_item == long_item {
                row[j]
            } else {
                // substitute, insert, delete
                1 + row[j].min(row[j + 1]).min(next[j])
            };
            next.push(cost);
        }

        row = next;
    }

    row[shorter.len()]
}

/// Edit distance for dynamically typed input such as JSON batch files.
///
/// Only JSON strings are text; anything else is rejected rather than
/// stringified.
pub fn edit_distance_values(a: &Value, b: &Value) -> Result<usize, ScoreError> {
    let a = expect_text("a", a)?;
    let b = expect_text("b", b)?;
    Ok(edit_distance(a, b))
}

pub(crate) fn expect_text<'v>(
    argument: &'static str,
    value: &'v Value,
) -> Result<&'v str, ScoreError> {
    match value {
        Value::String(s) => Ok(s.as_str()),
        other => Err(ScoreError::NotText {
            argument,
            found: json_type_name(other),
        }),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
