//! Hard failures. Everything recoverable goes through
//! [`crate::domain::Diagnostics`] instead.

use thiserror::Error;

use crate::domain::ChapterId;

/// Failure talking to a question bank or exam history store
#[derive(Debug, Error)]
pub enum RepositoryError {
  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),
  #[error("question bank unavailable")]
  Unavailable,
}

#[derive(Debug, Error)]
pub enum EngineError {
  /// Nothing could be selected for the whole matrix
  #[error("no questions available for chapters: {}", format_chapters(.chapters))]
  EmptyPool { chapters: Vec<ChapterId> },
  #[error("invalid request: {0}")]
  InvalidRequest(String),
  #[error(transparent)]
  Repository(#[from] RepositoryError),
}

impl EngineError {
  /// Returns a user-facing message without internal details.
  pub fn user_message(&self) -> &str {
    match self {
      EngineError::EmptyPool { .. } => {
        "No questions could be selected for this matrix. Add questions to the bank or change the matrix."
      }
      EngineError::InvalidRequest(_) => "The exam request is invalid",
      EngineError::Repository(_) => "The question bank could not be read",
    }
  }

  pub fn is_empty_pool(&self) -> bool {
    matches!(self, EngineError::EmptyPool { .. })
  }
}

fn format_chapters(chapters: &[ChapterId]) -> String {
  chapters.iter().map(ChapterId::as_str).collect::<Vec<_>>().join(", ")
}
