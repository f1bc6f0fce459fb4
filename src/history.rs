use crate::app_dirs::AppDirs;
use crate::result::{StoredResult, TypingResult};
use chrono::{DateTime, Local};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const SELECT_COLUMNS: &str = r#"
    SELECT id, user_name, start_time, end_time, duration, accuracy, edit_distance,
           speed, words, timestamp, given_text, typed_text
    FROM results
"#;

/// Per-user aggregates shown on the users page.
#[derive(Debug, Clone, PartialEq)]
pub struct UserSummary {
    pub user_name: String,
    pub tests: i64,
    pub average_accuracy: f64,
    pub average_speed: f64,
}

/// Persistent store of finished typing tests
#[derive(Debug)]
pub struct ResultsDb {
    conn: Connection,
}

impl ResultsDb {
    /// Open the database at the default location, creating it if needed
    pub fn new() -> Result<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("accutype_results.db"));
        Self::open(db_path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }
        debug!(path = %path.display(), "opening results database");
        Self::with_connection(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_name TEXT NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT NOT NULL,
                duration INTEGER NOT NULL,
                accuracy INTEGER NOT NULL,
                edit_distance INTEGER NOT NULL,
                speed INTEGER NOT NULL,
                words INTEGER NOT NULL,
                timestamp TEXT NOT NULL,
                given_text TEXT NOT NULL,
                typed_text TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_results_user ON results(user_name)",
            [],
        )?;

        Ok(ResultsDb { conn })
    }

    /// Store a result and return its id
    pub fn insert(&self, result: &TypingResult) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO results
            (user_name, start_time, end_time, duration, accuracy, edit_distance,
             speed, words, timestamp, given_text, typed_text)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                result.user_name(),
                result.start_time().to_rfc3339(),
                result.end_time().to_rfc3339(),
                result.duration_seconds(),
                result.accuracy_percent(),
                result.edit_distance() as i64,
                result.words_per_minute(),
                result.words() as i64,
                result.timestamp(),
                result.given_text(),
                result.typed_text(),
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        info!(id, user = %result.user_name(), "stored result");
        Ok(id)
    }

    pub fn get(&self, id: i64) -> Result<Option<StoredResult>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
        self.conn
            .query_row(&sql, [id], stored_from_row)
            .optional()
    }

    /// All results, oldest first
    pub fn list(&self) -> Result<Vec<StoredResult>> {
        self.query(&format!("{SELECT_COLUMNS} ORDER BY id"), [])
    }

    pub fn list_for_user(&self, user_name: &str) -> Result<Vec<StoredResult>> {
        self.query(
            &format!("{SELECT_COLUMNS} WHERE user_name = ?1 ORDER BY id"),
            [user_name],
        )
    }

    fn query<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<StoredResult>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, stored_from_row)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }

        Ok(results)
    }

    /// Returns false if no result had that id
    pub fn remove(&self, id: i64) -> Result<bool> {
        let removed = self.conn.execute("DELETE FROM results WHERE id = ?1", [id])?;
        Ok(removed > 0)
    }

    /// Clear all results
    pub fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM results", [])?;
        Ok(())
    }

    /// Distinct user names, sorted
    pub fn users(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT user_name FROM results ORDER BY user_name")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>>>()?;
        Ok(names)
    }

    /// Test count and averages for one user, `None` if they have no results
    pub fn user_summary(&self, user_name: &str) -> Result<Option<UserSummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT COUNT(*), AVG(accuracy), AVG(speed)
            FROM results
            WHERE user_name = ?1
            "#,
        )?;

        let (tests, average_accuracy, average_speed): (i64, Option<f64>, Option<f64>) = stmt
            .query_row([user_name], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?;

        if tests == 0 {
            return Ok(None);
        }

        Ok(Some(UserSummary {
            user_name: user_name.to_string(),
            tests,
            average_accuracy: average_accuracy.unwrap_or(0.0),
            average_speed: average_speed.unwrap_or(0.0),
        }))
    }
}

fn parse_time(row: &Row, idx: usize) -> Result<DateTime<Local>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|t| t.with_timezone(&Local))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn stored_from_row(row: &Row) -> Result<StoredResult> {
    let edit_distance: i64 = row.get(6)?;
    let words: i64 = row.get(8)?;
    Ok(StoredResult {
        id: row.get(0)?,
        result: TypingResult {
            user_name: row.get(1)?,
            start_time: parse_time(row, 2)?,
            end_time: parse_time(row, 3)?,
            duration_seconds: row.get(4)?,
            accuracy_percent: row.get(5)?,
            edit_distance: edit_distance as usize,
            words_per_minute: row.get(7)?,
            words: words as usize,
            timestamp: row.get(9)?,
            given_text: row.get(10)?,
            typed_text: row.get(11)?,
        },
    })
}
