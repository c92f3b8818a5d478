use chrono::{DateTime, Utc};
use std::collections::HashSet;

use super::{ExamHistoryRepository, QuestionRepository, RepoResult};
use crate::domain::{ChapterId, ExamId, Question, QuestionId};

#[derive(Debug, Clone)]
struct ExamRecord {
  id: ExamId,
  created_at: DateTime<Utc>,
  questions: Vec<QuestionId>,
}

/// Question bank and exam history held in memory.
///
/// Questions are returned in insertion order, which keeps selection
/// reproducible under a seeded random source.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBank {
  questions: Vec<Question>,
  exams: Vec<ExamRecord>,
}

impl InMemoryBank {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_questions(questions: impl IntoIterator<Item = Question>) -> Self {
    let mut bank = Self::new();
    bank.questions.extend(questions);
    bank
  }

  pub fn add_question(&mut self, question: Question) {
    self.questions.push(question);
  }

  pub fn add_questions(&mut self, questions: impl IntoIterator<Item = Question>) {
    self.questions.extend(questions);
  }

  /// Record a past exam that used the given questions
  pub fn add_exam(&mut self, id: impl Into<String>, created_at: DateTime<Utc>, questions: &[&str]) {
    self.exams.push(ExamRecord {
      id: ExamId::new(id),
      created_at,
      questions: questions.iter().map(|q| QuestionId::new(*q)).collect(),
    });
  }

  pub fn len(&self) -> usize {
    self.questions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.questions.is_empty()
  }
}

impl QuestionRepository for InMemoryBank {
  fn find_by_chapter(
    &self,
    chapter_id: &ChapterId,
    exclude: &HashSet<QuestionId>,
    limit: usize,
  ) -> RepoResult<Vec<Question>> {
    Ok(
      self
        .questions
        .iter()
        .filter(|q| &q.chapter_id == chapter_id && q.is_eligible() && !exclude.contains(&q.id))
        .take(limit)
        .cloned()
        .collect(),
    )
  }

  fn find_children(&self, parent_ids: &[QuestionId]) -> RepoResult<Vec<Question>> {
    Ok(
      self
        .questions
        .iter()
        .filter(|q| !q.deleted)
        .filter(|q| q.parent_id.as_ref().is_some_and(|p| parent_ids.contains(p)))
        .cloned()
        .collect(),
    )
  }

  fn find_by_ids(&self, ids: &[QuestionId]) -> RepoResult<Vec<Question>> {
    let wanted: HashSet<&QuestionId> = ids.iter().collect();
    Ok(self.questions.iter().filter(|q| wanted.contains(&q.id)).cloned().collect())
  }
}

impl ExamHistoryRepository for InMemoryBank {
  fn exams_created_since(&self, since: DateTime<Utc>) -> RepoResult<Vec<ExamId>> {
    Ok(
      self
        .exams
        .iter()
        .filter(|e| e.created_at >= since)
        .map(|e| e.id.clone())
        .collect(),
    )
  }

  fn questions_used_in(&self, exam_ids: &[ExamId]) -> RepoResult<HashSet<QuestionId>> {
    Ok(
      self
        .exams
        .iter()
        .filter(|e| exam_ids.contains(&e.id))
        .flat_map(|e| e.questions.iter().cloned())
        .collect(),
    )
  }
}
