//! Candidate pool: chapter -> outcome rank -> questions.
//!
//! A `Pool` is never edited in place. Each selection step takes the current
//! pool and gets back a new one without the chosen IDs, so a question picked
//! for one bucket disappears from every other bucket at the same time.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::domain::{ChapterId, Question, QuestionId};

/// Questions of one chapter bucketed by rank (0 = unranked)
#[derive(Debug, Clone, Default)]
pub struct ChapterPool {
  buckets: BTreeMap<u8, Vec<Arc<Question>>>,
}

impl ChapterPool {
  fn push(&mut self, question: Arc<Question>) {
    let rank = question.known_rank().unwrap_or(0);
    self.buckets.entry(rank).or_default().push(question);
  }

  pub fn bucket(&self, rank: u8) -> &[Arc<Question>] {
    self.buckets.get(&rank).map(Vec::as_slice).unwrap_or(&[])
  }

  /// All questions of the chapter, ranks ascending, unranked first
  pub fn questions(&self) -> Vec<Arc<Question>> {
    self.buckets.values().flatten().cloned().collect()
  }

  pub fn len(&self) -> usize {
    self.buckets.values().map(Vec::len).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  fn without(&self, ids: &HashSet<QuestionId>) -> ChapterPool {
    let buckets = self
      .buckets
      .iter()
      .map(|(rank, questions)| {
        let kept: Vec<_> = questions.iter().filter(|q| !ids.contains(&q.id)).cloned().collect();
        (*rank, kept)
      })
      .filter(|(_, questions)| !questions.is_empty())
      .collect();
    ChapterPool { buckets }
  }
}

#[derive(Debug, Clone, Default)]
pub struct Pool {
  chapters: BTreeMap<ChapterId, ChapterPool>,
}

impl Pool {
  pub fn new() -> Self {
    Self::default()
  }

  /// Build a pool from loaded questions, keyed by each question's own chapter.
  /// Later duplicates of an ID are ignored.
  pub fn from_questions(questions: impl IntoIterator<Item = Question>) -> Self {
    let mut pool = Pool::new();
    let mut seen = HashSet::new();
    for question in questions {
      if seen.insert(question.id.clone()) {
        pool.insert(question);
      }
    }
    pool
  }

  fn insert(&mut self, question: Question) {
    self
      .chapters
      .entry(question.chapter_id.clone())
      .or_default()
      .push(Arc::new(question));
  }

  /// Return a pool that also holds `questions`, skipping IDs already present
  pub fn merged_with(&self, questions: impl IntoIterator<Item = Question>) -> (Pool, usize) {
    let mut merged = self.clone();
    let mut seen = self.ids();
    let mut added = 0;
    for question in questions {
      if seen.insert(question.id.clone()) {
        merged.insert(question);
        added += 1;
      }
    }
    (merged, added)
  }

  pub fn chapter(&self, chapter_id: &ChapterId) -> Option<&ChapterPool> {
    self.chapters.get(chapter_id)
  }

  pub fn bucket(&self, chapter_id: &ChapterId, rank: u8) -> &[Arc<Question>] {
    self.chapter(chapter_id).map(|c| c.bucket(rank)).unwrap_or(&[])
  }

  pub fn chapter_questions(&self, chapter_id: &ChapterId) -> Vec<Arc<Question>> {
    self.chapter(chapter_id).map(ChapterPool::questions).unwrap_or_default()
  }

  /// Every remaining question, chapters in ID order
  pub fn all_questions(&self) -> Vec<Arc<Question>> {
    self.chapters.values().flat_map(ChapterPool::questions).collect()
  }

  pub fn ids(&self) -> HashSet<QuestionId> {
    self
      .chapters
      .values()
      .flat_map(|c| c.buckets.values().flatten())
      .map(|q| q.id.clone())
      .collect()
  }

  /// New pool with `ids` removed from every chapter and bucket
  pub fn without(&self, ids: &HashSet<QuestionId>) -> Pool {
    if ids.is_empty() {
      return self.clone();
    }
    let chapters = self
      .chapters
      .iter()
      .map(|(chapter_id, chapter)| (chapter_id.clone(), chapter.without(ids)))
      .filter(|(_, chapter)| !chapter.is_empty())
      .collect();
    Pool { chapters }
  }

  pub fn len(&self) -> usize {
    self.chapters.values().map(ChapterPool::len).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}
