//! Recently used questions, read from exam history.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;

use crate::config::EngineConfig;
use crate::domain::{ChapterId, Question, QuestionId};
use crate::repository::{ExamHistoryRepository, QuestionRepository, RepoResult};

/// Trailing windows used to keep fresh exams from repeating old ones
#[derive(Debug, Clone, Copy)]
pub struct RecencyWindow {
  pub recent: Duration,
  pub expanded: Duration,
}

impl RecencyWindow {
  pub fn from_config(config: &EngineConfig) -> Self {
    Self {
      recent: window_days(config.recent_window_days),
      expanded: window_days(config.expanded_window_days),
    }
  }
}

/// Out-of-range day counts saturate instead of panicking
fn window_days(days: i64) -> Duration {
  Duration::try_days(days.max(0)).unwrap_or(Duration::MAX)
}

impl Default for RecencyWindow {
  fn default() -> Self {
    Self::from_config(&EngineConfig::default())
  }
}

pub struct RecencyTracker<'a> {
  history: &'a dyn ExamHistoryRepository,
  questions: &'a dyn QuestionRepository,
  window: RecencyWindow,
  now: DateTime<Utc>,
}

impl<'a> RecencyTracker<'a> {
  pub fn new(
    history: &'a dyn ExamHistoryRepository,
    questions: &'a dyn QuestionRepository,
    window: RecencyWindow,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      history,
      questions,
      window,
      now,
    }
  }

  /// Start of a window ending now; a window reaching past the earliest
  /// representable time covers all history
  fn window_start(&self, window: Duration) -> DateTime<Utc> {
    self.now.checked_sub_signed(window).unwrap_or(DateTime::<Utc>::MIN_UTC)
  }

  fn used_since(&self, since: DateTime<Utc>) -> RepoResult<HashSet<QuestionId>> {
    let exams = self.history.exams_created_since(since)?;
    if exams.is_empty() {
      return Ok(HashSet::new());
    }
    self.history.questions_used_in(&exams)
  }

  /// Questions referenced by any exam created inside the recent window
  pub fn used_recently(&self) -> RepoResult<HashSet<QuestionId>> {
    let used = self.used_since(self.window_start(self.window.recent))?;
    tracing::debug!("{} questions used in the last {} days", used.len(), self.window.recent.num_days());
    Ok(used)
  }

  /// Eligible questions of `chapters` used inside the expanded window, minus `exclude`
  pub fn expanded_pool(&self, chapters: &[ChapterId], exclude: &HashSet<QuestionId>) -> RepoResult<Vec<Question>> {
    let mut ids: Vec<QuestionId> = self
      .used_since(self.window_start(self.window.expanded))?
      .into_iter()
      .filter(|id| !exclude.contains(id))
      .collect();
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    ids.sort();

    let mut questions: Vec<Question> = self
      .questions
      .find_by_ids(&ids)?
      .into_iter()
      .filter(|q| q.is_eligible() && chapters.contains(&q.chapter_id))
      .collect();
    questions.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(questions)
  }
}
