use crate::app_dirs::AppDirs;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};

/// One finished session, as appended to the CSV log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub date: DateTime<Local>,
    pub deck: String,
    pub answered: u32,
    pub correct: u32,
    pub wrong: u32,
    /// Percentage, 0-100; blank sessions log 0
    pub accuracy: f64,
    pub score: u32,
}

/// Append-only CSV history of finished sessions.
///
/// Purely informational: the progress screen lists recent sessions from it,
/// and losing the file loses nothing but that listing.
#[derive(Debug, Clone)]
pub struct SessionLog {
    path: PathBuf,
}

impl SessionLog {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path =
            AppDirs::session_log_path().unwrap_or_else(|| PathBuf::from("kanado_sessions.csv"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    /// Append one session row, writing the header on first use.
    pub fn append(&self, record: &SessionRecord) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let needs_header = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;
        Ok(())
    }

    /// The `count` most recent sessions, newest first. An absent or
    /// unreadable log reads as empty.
    pub fn recent(&self, count: usize) -> Vec<SessionRecord> {
        let reader = match csv::Reader::from_path(&self.path) {
            Ok(reader) => reader,
            Err(_) => return Vec::new(),
        };

        let mut records: Vec<SessionRecord> = reader
            .into_deserialize()
            .filter_map(|row| row.ok())
            .collect();
        records.reverse();
        records.truncate(count);
        records
    }
}
