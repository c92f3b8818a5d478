//! Loads the candidate pool for a matrix, chapter by chapter.

use std::collections::HashSet;

use super::pool::Pool;
use crate::domain::{ChapterId, Diagnostics, MatrixRequirement, Question, QuestionId, Warning};
use crate::recency::RecencyTracker;
use crate::repository::{QuestionRepository, RepoResult};

#[cfg(feature = "profiling")]
use crate::profiling::EventType;

pub struct PoolLoader<'a> {
  questions: &'a dyn QuestionRepository,
  tracker: &'a RecencyTracker<'a>,
  chapter_cap: usize,
  expansion_threshold: f64,
}

impl<'a> PoolLoader<'a> {
  pub fn new(
    questions: &'a dyn QuestionRepository,
    tracker: &'a RecencyTracker<'a>,
    chapter_cap: usize,
    expansion_threshold: f64,
  ) -> Self {
    Self {
      questions,
      tracker,
      chapter_cap,
      expansion_threshold,
    }
  }

  /// Load fresh questions for every matrix chapter, widening to the expanded
  /// recency window when fewer than `threshold * demand` are available.
  pub fn load(&self, matrix: &[MatrixRequirement], demand: u32, diagnostics: &mut Diagnostics) -> RepoResult<Pool> {
    let used = self.tracker.used_recently()?;
    let chapters = distinct_chapters(matrix);

    let mut fresh = Vec::new();
    for chapter_id in &chapters {
      let loaded = crate::profile_scope!("pool_load_chapter", {
        self.load_chapter(chapter_id, &used)?
      });
      tracing::debug!("Chapter {}: {} fresh candidates", chapter_id, loaded.len());

      #[cfg(feature = "profiling")]
      crate::profile_log!(EventType::PoolLoad {
        chapter: chapter_id.to_string(),
        loaded: loaded.len() as i64,
        excluded: used.len() as i64,
      });

      fresh.extend(loaded);
    }

    let pool = Pool::from_questions(fresh);
    let fresh_count = pool.len() as u32;

    if (fresh_count as f64) >= self.expansion_threshold * demand as f64 {
      return Ok(pool);
    }

    let expanded = self.tracker.expanded_pool(&chapters, &used)?;
    let (pool, added) = pool.merged_with(expanded);
    if added == 0 {
      tracing::debug!("Expanded recency window added nothing ({} fresh, demand {})", fresh_count, demand);
      return Ok(pool);
    }
    diagnostics.record(Warning::RecencyWindowExpanded {
      fresh: fresh_count,
      demand,
      added: added as u32,
    });
    Ok(pool)
  }

  fn load_chapter(&self, chapter_id: &ChapterId, used: &HashSet<QuestionId>) -> RepoResult<Vec<Question>> {
    let questions = self.questions.find_by_chapter(chapter_id, used, self.chapter_cap)?;
    // Repositories may ignore part of the filter; enforce it here
    Ok(
      questions
        .into_iter()
        .filter(|q| q.is_eligible() && !used.contains(&q.id))
        .collect(),
    )
  }
}

fn distinct_chapters(matrix: &[MatrixRequirement]) -> Vec<ChapterId> {
  let mut seen = HashSet::new();
  matrix
    .iter()
    .filter(|row| seen.insert(row.chapter_id.clone()))
    .map(|row| row.chapter_id.clone())
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::recency::RecencyWindow;
  use crate::repository::InMemoryBank;
  use crate::testing::ranked;
  use chrono::{Duration, Utc};

  fn matrix() -> Vec<MatrixRequirement> {
    vec![MatrixRequirement::new("C1", [2, 0, 0, 0, 0])]
  }

  #[test]
  fn test_load_skips_recently_used() {
    let now = Utc::now();
    let mut bank = InMemoryBank::with_questions(vec![
      ranked("Q1", "C1", 1),
      ranked("Q2", "C1", 1),
      ranked("Q3", "C1", 1),
    ]);
    bank.add_exam("E1", now - Duration::days(3), &["Q1"]);

    let tracker = RecencyTracker::new(&bank, &bank, RecencyWindow::default(), now);
    let loader = PoolLoader::new(&bank, &tracker, 500, 0.5);
    let mut diagnostics = Diagnostics::new();
    let pool = loader.load(&matrix(), 2, &mut diagnostics).unwrap();

    assert_eq!(pool.len(), 2);
    assert!(!pool.ids().contains(&QuestionId::new("Q1")));
    assert!(diagnostics.is_empty());
  }

  #[test]
  fn test_load_respects_chapter_cap() {
    let questions: Vec<Question> = (0..10).map(|i| ranked(&format!("Q{}", i), "C1", 1)).collect();
    let bank = InMemoryBank::with_questions(questions);
    let tracker = RecencyTracker::new(&bank, &bank, RecencyWindow::default(), Utc::now());
    let loader = PoolLoader::new(&bank, &tracker, 4, 0.5);
    let pool = loader.load(&matrix(), 2, &mut Diagnostics::new()).unwrap();
    assert_eq!(pool.len(), 4);
  }

  #[test]
  fn test_small_fresh_pool_triggers_expansion() {
    let now = Utc::now();
    let mut bank = InMemoryBank::with_questions(vec![
      ranked("Q1", "C1", 1),
      ranked("Q2", "C1", 1),
      ranked("Q3", "C1", 1),
    ]);
    bank.add_exam("E1", now - Duration::days(7), &["Q2"]);
    bank.add_exam("E2", now - Duration::days(40), &["Q3"]);

    let tracker = RecencyTracker::new(&bank, &bank, RecencyWindow::default(), now);
    // Cap of one keeps Q3 out of the fresh load
    let loader = PoolLoader::new(&bank, &tracker, 1, 0.5);
    let mut diagnostics = Diagnostics::new();
    let matrix = vec![MatrixRequirement::new("C1", [4, 0, 0, 0, 0])];
    let pool = loader.load(&matrix, 4, &mut diagnostics).unwrap();

    let ids = pool.ids();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&QuestionId::new("Q1")));
    assert!(ids.contains(&QuestionId::new("Q3")));
    assert!(!ids.contains(&QuestionId::new("Q2")));
    assert!(matches!(
      diagnostics.warnings()[0],
      Warning::RecencyWindowExpanded { fresh: 1, demand: 4, added: 1 }
    ));
  }

  #[test]
  fn test_fruitless_expansion_is_silent() {
    let bank = InMemoryBank::with_questions(vec![ranked("Q1", "C1", 1)]);
    let tracker = RecencyTracker::new(&bank, &bank, RecencyWindow::default(), Utc::now());
    let loader = PoolLoader::new(&bank, &tracker, 500, 0.5);
    let mut diagnostics = Diagnostics::new();
    let matrix = vec![MatrixRequirement::new("C1", [4, 0, 0, 0, 0])];
    let pool = loader.load(&matrix, 4, &mut diagnostics).unwrap();

    assert_eq!(pool.len(), 1);
    assert!(diagnostics.is_empty());
  }

  #[test]
  fn test_distinct_chapters_keeps_order() {
    let matrix = vec![
      MatrixRequirement::new("C2", [1, 0, 0, 0, 0]),
      MatrixRequirement::new("C1", [1, 0, 0, 0, 0]),
      MatrixRequirement::new("C2", [0, 1, 0, 0, 0]),
    ];
    let chapters = distinct_chapters(&matrix);
    assert_eq!(chapters, vec![ChapterId::new("C2"), ChapterId::new("C1")]);
  }
}
