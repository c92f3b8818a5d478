//! Project path functions - single source of truth for all file paths.
//!
//! ## Environment Variables
//!
//! - `DATA_DIR`: Override the base data directory (default: "data")
//!
//! This allows keeping separate question banks side by side:
//! ```bash
//! DATA_DIR=data/term1 exam-assembler generate --matrix matrix.json
//! ```

use std::env;
use std::sync::OnceLock;

/// Lazily initialized data directory from DATA_DIR env var
static DATA_DIR_VALUE: OnceLock<String> = OnceLock::new();

/// Get the base data directory (from DATA_DIR env var or default "data")
pub fn data_dir() -> &'static str {
    DATA_DIR_VALUE.get_or_init(|| env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()))
}

/// Default SQLite question bank path
pub fn db_path() -> String {
    format!("{}/questions.db", data_dir())
}

/// JSONL profiling log for one session
pub fn profile_log_path(session: &str) -> String {
    format!("{}/profile_{session}.jsonl", data_dir())
}

#[cfg(test)]
mod tests {
    use super::*;

    // OnceLock initializes once, so only the default shape is checked

    #[test]
    fn test_data_dir_default() {
        let dir = data_dir();
        assert!(!dir.is_empty());
    }

    #[test]
    fn test_db_path_format() {
        assert!(db_path().ends_with("/questions.db"));
    }

    #[test]
    fn test_profile_log_path() {
        let path = profile_log_path("20260101_120000");
        assert!(path.ends_with("/profile_20260101_120000.jsonl"));
    }
}
