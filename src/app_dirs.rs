use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("kanado"),
            )
        } else {
            ProjectDirs::from("", "", "kanado").map(|pd| pd.data_local_dir().to_path_buf())
        }
    }

    /// Sqlite answer log under the state directory
    pub fn answers_db_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("answers.db"))
    }

    /// CSV log of finished sessions
    pub fn session_log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("sessions.csv"))
    }

    /// Opt-in tracing output; stderr belongs to the TUI
    pub fn log_file_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("kanado.log"))
    }
}
