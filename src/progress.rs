use chrono::{DateTime, Local};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// On-disk format version; bump when `AllTimeStats` changes shape
pub const PROGRESS_FORMAT_VERSION: u32 = 1;

/// Cumulative correct/incorrect counts for one glyph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasteryCount {
    pub correct: u64,
    pub incorrect: u64,
}

/// Durable performance totals across every session.
///
/// The only state that survives a restart. Counts only ever grow; the one
/// way down is [`crate::session::StatsAggregator::clear_all_progress`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AllTimeStats {
    pub total_sessions: u64,
    pub total_correct: u64,
    pub total_incorrect: u64,
    pub best_streak: u64,
    pub character_mastery: HashMap<String, MasteryCount>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ProgressFile {
    version: u32,
    saved_at: DateTime<Local>,
    stats: AllTimeStats,
}

pub trait ProgressStore {
    /// Load the persisted stats, falling back to pristine defaults when the
    /// file is absent, unreadable, or from an unknown format version.
    fn load(&self) -> AllTimeStats;
    fn save(&self, stats: &AllTimeStats) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileProgressStore {
    path: PathBuf,
}

impl FileProgressStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "kanado") {
            pd.data_dir().join("progress.json")
        } else {
            PathBuf::from("kanado_progress.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }
}

impl Default for FileProgressStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressStore for FileProgressStore {
    fn load(&self) -> AllTimeStats {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(_) => return AllTimeStats::default(),
        };

        match serde_json::from_slice::<ProgressFile>(&bytes) {
            Ok(file) if file.version == PROGRESS_FORMAT_VERSION => file.stats,
            Ok(file) => {
                tracing::warn!(
                    version = file.version,
                    "progress file from unknown format version, starting fresh"
                );
                AllTimeStats::default()
            }
            Err(err) => {
                tracing::warn!(%err, "progress file unreadable, starting fresh");
                AllTimeStats::default()
            }
        }
    }

    fn save(&self, stats: &AllTimeStats) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = ProgressFile {
            version: PROGRESS_FORMAT_VERSION,
            saved_at: Local::now(),
            stats: stats.clone(),
        };
        let data = serde_json::to_vec_pretty(&file).unwrap_or_default();
        fs::write(&self.path, data)
    }
}

/// In-memory store for tests and headless runs
#[derive(Debug, Default)]
pub struct MemoryProgressStore {
    stats: std::sync::Mutex<AllTimeStats>,
}

impl ProgressStore for MemoryProgressStore {
    fn load(&self) -> AllTimeStats {
        self.stats.lock().expect("progress store poisoned").clone()
    }

    fn save(&self, stats: &AllTimeStats) -> std::io::Result<()> {
        *self.stats.lock().expect("progress store poisoned") = stats.clone();
        Ok(())
    }
}
