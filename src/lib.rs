// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod achievements;
pub mod app_dirs;
pub mod config;
pub mod engine;
pub mod error;
pub mod kana;
pub mod progress;
pub mod question;
pub mod quiz;
pub mod runtime;
pub mod session;
pub mod session_log;
pub mod stats;
pub mod util;

pub use error::QuizError;
