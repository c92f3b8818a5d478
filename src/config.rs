//! Application configuration.
//!
//! Every value is resolved with the same priority:
//! `config.toml` > environment (`.env` is loaded first) > default.
//!
//! ```toml
//! [database]
//! path = "data/questions.db"
//!
//! [engine]
//! recent_window_days = 30
//! expanded_window_days = 60
//! chapter_question_cap = 500
//! expansion_threshold = 0.5
//! group_policy = "lenient"
//! cross_chapter_fallback = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::groups::GroupPolicy;
use crate::paths;

pub const CONFIG_FILE: &str = "config.toml";

// ==================== Engine Defaults ====================

/// Questions used by exams younger than this are skipped
pub const DEFAULT_RECENT_WINDOW_DAYS: i64 = 30;

/// Wider window consulted when the fresh pool is too small
pub const DEFAULT_EXPANDED_WINDOW_DAYS: i64 = 60;

/// Longest recency window accepted, about a century
pub const MAX_WINDOW_DAYS: i64 = 36_500;

/// Upper bound on candidates loaded per chapter
pub const DEFAULT_CHAPTER_QUESTION_CAP: usize = 500;

/// Fresh pool below this fraction of demand triggers the expanded window
pub const DEFAULT_EXPANSION_THRESHOLD: f64 = 0.5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },
}

impl ConfigError {
    /// Returns a user-facing message without internal details.
    pub fn user_message(&self) -> String {
        match self {
            ConfigError::Io { path, .. } => format!("Could not read {}", path.display()),
            ConfigError::Parse(_) => format!("{} is not valid TOML", CONFIG_FILE),
            ConfigError::InvalidValue { key, .. } => format!("Setting {} has an invalid value", key),
        }
    }
}

/// Tunables of the selection engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub recent_window_days: i64,
    pub expanded_window_days: i64,
    pub chapter_question_cap: usize,
    pub expansion_threshold: f64,
    pub group_policy: GroupPolicy,
    /// Allow tier 3 to fill a chapter from other chapters
    pub cross_chapter_fallback: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            recent_window_days: DEFAULT_RECENT_WINDOW_DAYS,
            expanded_window_days: DEFAULT_EXPANDED_WINDOW_DAYS,
            chapter_question_cap: DEFAULT_CHAPTER_QUESTION_CAP,
            expansion_threshold: DEFAULT_EXPANSION_THRESHOLD,
            group_policy: GroupPolicy::default(),
            cross_chapter_fallback: true,
        }
    }
}

impl EngineConfig {
    /// Parse the `[engine]` table of a TOML document, ignoring the environment
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: AppConfig = toml::from_str(contents)?;
        let config = file.engine.unwrap_or_default().resolve(|_| None)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0..=MAX_WINDOW_DAYS).contains(&self.recent_window_days) {
            return Err(invalid("recent_window_days", self.recent_window_days));
        }
        if self.expanded_window_days < self.recent_window_days || self.expanded_window_days > MAX_WINDOW_DAYS {
            return Err(invalid("expanded_window_days", self.expanded_window_days));
        }
        if self.chapter_question_cap == 0 {
            return Err(invalid("chapter_question_cap", self.chapter_question_cap));
        }
        if !(0.0..=1.0).contains(&self.expansion_threshold) {
            return Err(invalid("expansion_threshold", self.expansion_threshold));
        }
        Ok(())
    }
}

fn invalid(key: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

// ==================== config.toml ====================

/// Configuration file structure for config.toml
#[derive(Debug, Default, Deserialize)]
struct AppConfig {
    database: Option<DatabaseConfig>,
    engine: Option<EngineSection>,
}

#[derive(Debug, Deserialize)]
struct DatabaseConfig {
    path: Option<String>,
}

/// `[engine]` as written; unset keys fall through to the environment
#[derive(Debug, Default, Deserialize)]
struct EngineSection {
    recent_window_days: Option<i64>,
    expanded_window_days: Option<i64>,
    chapter_question_cap: Option<usize>,
    expansion_threshold: Option<f64>,
    group_policy: Option<GroupPolicy>,
    cross_chapter_fallback: Option<bool>,
}

impl EngineSection {
    fn resolve(self, env: impl Fn(&str) -> Option<String>) -> Result<EngineConfig, ConfigError> {
        let defaults = EngineConfig::default();
        Ok(EngineConfig {
            recent_window_days: pick(self.recent_window_days, &env, "EXAM_RECENT_DAYS", defaults.recent_window_days)?,
            expanded_window_days: pick(
                self.expanded_window_days,
                &env,
                "EXAM_EXPANDED_DAYS",
                defaults.expanded_window_days,
            )?,
            chapter_question_cap: pick(
                self.chapter_question_cap,
                &env,
                "EXAM_CHAPTER_CAP",
                defaults.chapter_question_cap,
            )?,
            expansion_threshold: self.expansion_threshold.unwrap_or(defaults.expansion_threshold),
            group_policy: self.group_policy.unwrap_or(defaults.group_policy),
            cross_chapter_fallback: self.cross_chapter_fallback.unwrap_or(defaults.cross_chapter_fallback),
        })
    }
}

/// File value, else environment variable, else default
fn pick<T: FromStr>(
    from_file: Option<T>,
    env: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    if let Some(value) = from_file {
        return Ok(value);
    }
    match env(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
        None => Ok(default),
    }
}

fn read_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Load engine settings with priority: config.toml > .env > default
pub fn load_engine_config() -> Result<EngineConfig, ConfigError> {
    load_engine_config_from(Path::new(CONFIG_FILE))
}

pub fn load_engine_config_from(path: &Path) -> Result<EngineConfig, ConfigError> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let file = read_config_file(path)?;
    let config = file
        .engine
        .unwrap_or_default()
        .resolve(|key| std::env::var(key).ok())?;
    config.validate()?;

    tracing::debug!(
        "Engine config: recent {}d, expanded {}d, cap {}, threshold {}",
        config.recent_window_days,
        config.expanded_window_days,
        config.chapter_question_cap,
        config.expansion_threshold
    );
    Ok(config)
}

/// Load database path with priority: config.toml > .env > default
pub fn load_database_path() -> PathBuf {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Priority 1: config.toml
    if let Ok(AppConfig {
        database: Some(DatabaseConfig { path: Some(path) }),
        ..
    }) = read_config_file(Path::new(CONFIG_FILE))
    {
        tracing::info!("Using database from config.toml: {}", path);
        return PathBuf::from(path);
    }

    // Priority 2: .env DATABASE_PATH
    if let Ok(path) = std::env::var("DATABASE_PATH") {
        tracing::info!("Using database from DATABASE_PATH env: {}", path);
        return PathBuf::from(path);
    }

    // Default
    let default = PathBuf::from(paths::db_path());
    tracing::info!("Using default database path: {}", default.display());
    default
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.recent_window_days, 30);
        assert_eq!(config.expanded_window_days, 60);
        assert_eq!(config.chapter_question_cap, 500);
        assert_eq!(config.expansion_threshold, 0.5);
        assert_eq!(config.group_policy, GroupPolicy::Lenient);
        assert!(config.cross_chapter_fallback);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_str() {
        let config = EngineConfig::from_toml_str(
            r#"
            [engine]
            recent_window_days = 14
            group_policy = "strict"
            cross_chapter_fallback = false
            "#,
        )
        .unwrap();
        assert_eq!(config.recent_window_days, 14);
        assert_eq!(config.expanded_window_days, 60);
        assert_eq!(config.group_policy, GroupPolicy::Strict);
        assert!(!config.cross_chapter_fallback);
    }

    #[test]
    fn test_missing_engine_table_uses_defaults() {
        let config = EngineConfig::from_toml_str("[database]\npath = \"x.db\"\n").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_file_beats_env_beats_default() {
        let section = EngineSection {
            recent_window_days: Some(10),
            ..Default::default()
        };
        let env = env_of(&[("EXAM_RECENT_DAYS", "20"), ("EXAM_CHAPTER_CAP", "50")]);
        let config = section.resolve(env).unwrap();
        assert_eq!(config.recent_window_days, 10);
        assert_eq!(config.chapter_question_cap, 50);
        assert_eq!(config.expanded_window_days, DEFAULT_EXPANDED_WINDOW_DAYS);
    }

    #[test]
    fn test_bad_env_value() {
        let env = env_of(&[("EXAM_EXPANDED_DAYS", "soon")]);
        let err = EngineSection::default().resolve(env).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "EXAM_EXPANDED_DAYS"));
    }

    #[test]
    fn test_validate_rejects_inverted_windows() {
        let err = EngineConfig::from_toml_str("[engine]\nrecent_window_days = 90\n").unwrap_err();
        assert!(err.user_message().contains("expanded_window_days"));
    }

    #[test]
    fn test_validate_rejects_oversized_windows() {
        let err = EngineConfig::from_toml_str(
            "[engine]\nrecent_window_days = 100000000\nexpanded_window_days = 100000000\n",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "recent_window_days"));

        let err = EngineConfig::from_toml_str("[engine]\nexpanded_window_days = 40000\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "expanded_window_days"));

        assert!(EngineConfig::from_toml_str("[engine]\nexpanded_window_days = 36500\n").is_ok());
    }

    #[test]
    fn test_validate_rejects_threshold_out_of_range() {
        assert!(EngineConfig::from_toml_str("[engine]\nexpansion_threshold = 1.5\n").is_err());
    }

    #[test]
    fn test_invalid_toml() {
        let err = EngineConfig::from_toml_str("[engine\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_engine_config_from(&dir.path().join("absent.toml"));
        // Environment may carry overrides; only parsing must succeed
        assert!(config.is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[engine]\nchapter_question_cap = 25\nrecent_window_days = 7\nexpanded_window_days = 21\n").unwrap();
        let config = load_engine_config_from(&path).unwrap();
        assert_eq!(config.chapter_question_cap, 25);
        assert_eq!(config.recent_window_days, 7);
        assert_eq!(config.expanded_window_days, 21);
    }
}
