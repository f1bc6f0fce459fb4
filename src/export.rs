//! CSV export of stored results, one row per test.

use crate::result::StoredResult;
use chrono::NaiveDate;
use std::io;
use std::path::Path;
use tracing::info;

pub const HEADER: [&str; 6] = ["Accuracy", "Speed", "Duration", "Words", "User", "Timestamp"];

/// Suggested export file name, e.g. `2024-03-09 - ada - Typing Test Results.csv`.
pub fn default_file_name(date: NaiveDate, user_name: &str) -> String {
    format!("{} - {} - Typing Test Results.csv", date.format("%Y-%m-%d"), user_name)
}

/// Columns as displayed in the results list.
pub fn display_row(stored: &StoredResult) -> [String; 6] {
    let r = &stored.result;
    [
        format!("{}%", r.accuracy_percent()),
        format!("{} WPM", r.words_per_minute()),
        format!("{} seconds", r.duration_seconds()),
        r.words().to_string(),
        r.user_name().to_string(),
        r.timestamp().to_string(),
    ]
}

pub fn write_csv<W: io::Write>(writer: W, results: &[StoredResult]) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER)?;
    for stored in results {
        wtr.write_record(display_row(stored))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_to_path<P: AsRef<Path>>(path: P, results: &[StoredResult]) -> csv::Result<()> {
    let file = std::fs::File::create(path.as_ref())?;
    write_csv(file, results)?;
    info!(path = %path.as_ref().display(), rows = results.len(), "exported results");
    Ok(())
}
