use crate::app_dirs::AppDirs;
use chrono::{DateTime, Local};
use rusqlite::{params, Connection, Result};
use std::path::PathBuf;
use std::time::SystemTime;

/// One answered question, as recorded in the durable log
#[derive(Debug, Clone)]
pub struct AnswerStat {
    pub kana: String,
    pub romaji: String,
    pub was_correct: bool,
    pub reverse: bool,
    pub response_ms: u64,
    pub timestamp: DateTime<Local>,
}

/// Per-glyph rollup over the whole answer log
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerSummary {
    pub kana: String,
    pub attempts: i64,
    pub miss_rate: f64,
    pub avg_response_ms: f64,
}

/// Append-only sqlite log of every answered question.
///
/// Opened best-effort; a missing or unwritable database downgrades the app
/// to session-only analytics instead of failing the quiz.
#[derive(Debug)]
pub struct AnswerDb {
    conn: Connection,
}

impl AnswerDb {
    /// Open (and if needed create) the answer log in the state directory.
    pub fn open() -> Result<Self> {
        let db_path = Self::db_path().unwrap_or_else(|| PathBuf::from("kanado_answers.db"));

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }

        let conn = Connection::open(&db_path)?;
        Self::init_schema(&conn)?;
        Ok(AnswerDb { conn })
    }

    /// In-memory log, used by tests and available to headless callers.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(AnswerDb { conn })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS answers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kana TEXT NOT NULL,
                romaji TEXT NOT NULL,
                was_correct BOOLEAN NOT NULL,
                reverse BOOLEAN NOT NULL,
                response_ms INTEGER NOT NULL,
                timestamp TEXT NOT NULL,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_answers_kana ON answers(kana)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_answers_timestamp ON answers(timestamp)",
            [],
        )?;

        Ok(())
    }

    fn db_path() -> Option<PathBuf> {
        AppDirs::answers_db_path()
    }

    /// Append one answer to the log.
    pub fn record_answer(&self, stat: &AnswerStat) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO answers (kana, romaji, was_correct, reverse, response_ms, timestamp)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                stat.kana,
                stat.romaji,
                stat.was_correct,
                stat.reverse,
                stat.response_ms,
                stat.timestamp.to_rfc3339(),
            ],
        )?;

        Ok(())
    }

    /// All answers ever recorded for one glyph, newest first.
    pub fn answers_for(&self, kana: &str) -> Result<Vec<AnswerStat>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT kana, romaji, was_correct, reverse, response_ms, timestamp
            FROM answers
            WHERE kana = ?1
            ORDER BY timestamp DESC
            "#,
        )?;

        let rows = stmt.query_map([kana], |row| {
            let timestamp_str: String = row.get(5)?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        5,
                        "timestamp".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);

            Ok(AnswerStat {
                kana: row.get(0)?,
                romaji: row.get(1)?,
                was_correct: row.get(2)?,
                reverse: row.get(3)?,
                response_ms: row.get(4)?,
                timestamp,
            })
        })?;

        rows.collect()
    }

    /// Miss rate (0-100) for one glyph across the whole log.
    pub fn miss_rate(&self, kana: &str) -> Result<f64> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT
                COUNT(*) as total,
                SUM(CASE WHEN was_correct = 0 THEN 1 ELSE 0 END) as incorrect
            FROM answers
            WHERE kana = ?1
            "#,
        )?;

        let (total, incorrect): (i64, i64) =
            stmt.query_row([kana], |row| Ok((row.get(0)?, row.get(1).unwrap_or(0))))?;

        if total == 0 {
            Ok(0.0)
        } else {
            Ok((incorrect as f64 / total as f64) * 100.0)
        }
    }

    /// Per-glyph rollups, worst miss rate first, for the progress screen.
    pub fn summary(&self) -> Result<Vec<AnswerSummary>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT
                kana,
                COUNT(*) as attempts,
                (SUM(CASE WHEN was_correct = 0 THEN 1 ELSE 0 END) * 100.0 / COUNT(*)) as miss_rate,
                AVG(CASE WHEN was_correct = 1 THEN response_ms END) as avg_response
            FROM answers
            GROUP BY kana
            ORDER BY miss_rate DESC, attempts DESC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let avg_response: Option<f64> = row.get(3)?;
            Ok(AnswerSummary {
                kana: row.get(0)?,
                attempts: row.get(1)?,
                miss_rate: row.get(2)?,
                avg_response_ms: avg_response.unwrap_or(0.0),
            })
        })?;

        rows.collect()
    }

    /// Total number of answers in the log.
    pub fn total_answers(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM answers", [], |row| row.get(0))
    }

    /// Remove every recorded answer.
    pub fn clear(&self) -> Result<()> {
        self.conn.execute("DELETE FROM answers", [])?;
        Ok(())
    }
}

/// Helper to compute elapsed milliseconds between two instants
pub fn time_diff_ms(start: SystemTime, end: SystemTime) -> u64 {
    end.duration_since(start).unwrap_or_default().as_millis() as u64
}
