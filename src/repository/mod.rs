//! Contracts for the question bank and exam history the assembler reads from.
//!
//! Two implementations ship with the crate: [`InMemoryBank`] for fixtures and
//! embedding callers, and [`crate::db::SqliteBank`] over the SQLite schema.

pub mod memory;

use chrono::{DateTime, Utc};
use std::collections::HashSet;

use crate::domain::{ChapterId, ExamId, Question, QuestionId};
use crate::error::RepositoryError;

pub use memory::InMemoryBank;

pub type RepoResult<T> = std::result::Result<T, RepositoryError>;

pub trait QuestionRepository {
  /// Non-deleted top-level questions of a chapter, skipping `exclude`, at most `limit`
  fn find_by_chapter(
    &self,
    chapter_id: &ChapterId,
    exclude: &HashSet<QuestionId>,
    limit: usize,
  ) -> RepoResult<Vec<Question>>;

  /// Non-deleted children of any of the given parents
  fn find_children(&self, parent_ids: &[QuestionId]) -> RepoResult<Vec<Question>>;

  /// Questions by ID, in no particular order; unknown IDs are skipped
  fn find_by_ids(&self, ids: &[QuestionId]) -> RepoResult<Vec<Question>>;
}

pub trait ExamHistoryRepository {
  fn exams_created_since(&self, since: DateTime<Utc>) -> RepoResult<Vec<ExamId>>;

  fn questions_used_in(&self, exam_ids: &[ExamId]) -> RepoResult<HashSet<QuestionId>>;
}
