//! SQLite question bank.

pub mod history;
pub mod questions;
pub mod schema;

use rusqlite::{Connection, Result};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::RepositoryError;

pub use history::{insert_exam, insert_exam_question};
pub use questions::{insert_answer, insert_chapter, insert_outcome, insert_question};
pub use schema::run_migrations;

pub type DbPool = Arc<Mutex<Connection>>;

/// IDs bound per `IN (...)` list
pub const ID_CHUNK_SIZE: usize = 500;

/// Extension trait for logging errors before discarding them
pub trait LogOnError<T> {
    /// Log the error at warn level and return None
    fn log_warn(self, context: &str) -> Option<T>;
}

impl<T, E: std::fmt::Display> LogOnError<T> for std::result::Result<T, E> {
    fn log_warn(self, context: &str) -> Option<T> {
        match self {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("{}: {}", context, e);
                None
            }
        }
    }
}

/// Try to acquire the database lock, returning an error if poisoned
pub fn try_lock(pool: &DbPool) -> std::result::Result<MutexGuard<'_, Connection>, RepositoryError> {
  pool.lock().map_err(|_: PoisonError<_>| {
    tracing::error!("Database mutex poisoned - a thread panicked while holding the lock");
    RepositoryError::Unavailable
  })
}

pub fn init_db(path: &Path) -> Result<DbPool> {
  if let Some(parent) = path.parent() {
    std::fs::create_dir_all(parent)
      .log_warn("Could not create database directory");
  }

  // Create backup before migrations if database exists
  if path.exists() {
    let backup_path = path.with_extension("db.backup");
    std::fs::copy(path, &backup_path).log_warn("Could not create database backup");
  }

  let conn = Connection::open(path)?;
  run_migrations(&conn)?;
  Ok(Arc::new(Mutex::new(conn)))
}

/// Question bank and exam history stored in SQLite
#[derive(Clone)]
pub struct SqliteBank {
  pool: DbPool,
}

impl SqliteBank {
  pub fn new(pool: DbPool) -> Self {
    Self { pool }
  }

  /// Open (and migrate) the bank at `path`
  pub fn open(path: &Path) -> std::result::Result<Self, RepositoryError> {
    Ok(Self::new(init_db(path)?))
  }

  /// Fresh migrated bank that lives only as long as the value
  pub fn in_memory() -> std::result::Result<Self, RepositoryError> {
    let conn = Connection::open_in_memory()?;
    run_migrations(&conn)?;
    Ok(Self::new(Arc::new(Mutex::new(conn))))
  }

  pub fn pool(&self) -> &DbPool {
    &self.pool
  }

  pub(crate) fn conn(&self) -> std::result::Result<MutexGuard<'_, Connection>, RepositoryError> {
    try_lock(&self.pool)
  }
}

/// `?, ?, ...` with `count` placeholders
pub(crate) fn placeholders(count: usize) -> String {
  vec!["?"; count].join(", ")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_placeholders() {
    assert_eq!(placeholders(1), "?");
    assert_eq!(placeholders(3), "?, ?, ?");
  }

  #[test]
  fn test_log_warn() {
    let failed: std::result::Result<u32, String> = Err("boom".into());
    assert_eq!(failed.log_warn("test"), None);
    let ok: std::result::Result<u32, String> = Ok(7);
    assert_eq!(ok.log_warn("test"), Some(7));
  }

  #[test]
  fn test_reopened_bank_keeps_questions() {
    use crate::domain::{ChapterId, QuestionId};
    use crate::repository::QuestionRepository;
    use crate::testing::TestEnv;

    let env = TestEnv::new();
    env.add_ranked("Q1", "C1", 3);

    let reopened = SqliteBank::open(&env.path().join("questions.db")).unwrap();
    let found = reopened.find_by_ids(&[QuestionId::new("Q1")]).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].chapter_id, ChapterId::new("C1"));
    assert_eq!(found[0].outcome_rank, 3);
  }

  #[test]
  fn test_init_db_creates_file_and_backup() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("bank.db");

    init_db(&path).unwrap();
    assert!(path.exists());

    init_db(&path).unwrap();
    assert!(path.with_extension("db.backup").exists());
  }

  #[test]
  fn test_poisoned_lock_is_unavailable() {
    let bank = SqliteBank::in_memory().unwrap();
    let pool = bank.pool().clone();
    let _ = std::thread::spawn(move || {
      let _guard = pool.lock().unwrap();
      panic!("poison the lock");
    })
    .join();

    assert!(matches!(bank.conn(), Err(RepositoryError::Unavailable)));
  }
}
