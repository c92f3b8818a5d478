use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared difficulty used when a question carries none
pub const DEFAULT_DIFFICULTY_LEVEL: u8 = 3;

/// Highest learning-outcome rank a matrix can ask for
pub const MAX_OUTCOME_RANK: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChapterId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExamId(pub String);

impl QuestionId {
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl ChapterId {
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl ExamId {
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for QuestionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl fmt::Display for ChapterId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl fmt::Display for ExamId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// A bank question as seen by the assembler.
///
/// `outcome_rank` is already resolved by the repository: 0 means the question
/// has no learning outcome (or one without a rank), 1-5 otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
  pub id: QuestionId,
  pub chapter_id: ChapterId,
  pub outcome_id: Option<String>,
  pub outcome_rank: u8,
  pub difficulty_level: u8,
  /// Difficulty measured from past results, 0.0 (hard) to 1.0 (easy)
  pub observed_difficulty: Option<f64>,

  // Usage stats
  pub times_administered: i64,
  pub times_correct: i64,

  // Grouping: parents declare how many children they own,
  // children point back at their parent
  pub child_count: u32,
  pub parent_id: Option<QuestionId>,
  pub sequence: Option<i64>,

  pub content: String,
  pub answer_count: u32,
  pub deleted: bool,
  pub created_at: DateTime<Utc>,
}

impl Question {
  pub fn new(id: impl Into<String>, chapter_id: impl Into<String>) -> Self {
    Self {
      id: QuestionId::new(id),
      chapter_id: ChapterId::new(chapter_id),
      outcome_id: None,
      outcome_rank: 0,
      difficulty_level: DEFAULT_DIFFICULTY_LEVEL,
      observed_difficulty: None,
      times_administered: 0,
      times_correct: 0,
      child_count: 0,
      parent_id: None,
      sequence: None,
      content: String::new(),
      answer_count: 0,
      deleted: false,
      created_at: Utc::now(),
    }
  }

  pub fn is_group_parent(&self) -> bool {
    self.child_count > 0
  }

  pub fn is_child(&self) -> bool {
    self.parent_id.is_some()
  }

  /// Top-level candidates: not soft-deleted and not owned by a parent
  pub fn is_eligible(&self) -> bool {
    !self.deleted && !self.is_child()
  }

  /// Historical success rate, if the question was ever administered
  pub fn success_rate(&self) -> Option<f64> {
    if self.times_administered > 0 {
      Some(self.times_correct as f64 / self.times_administered as f64)
    } else {
      None
    }
  }

  /// Outcome rank if known and within 1..=5
  pub fn known_rank(&self) -> Option<u8> {
    (1..=MAX_OUTCOME_RANK)
      .contains(&self.outcome_rank)
      .then_some(self.outcome_rank)
  }
}

/// An answer option. Only the count per question matters to the assembler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
  pub id: String,
  pub question_id: QuestionId,
  pub order: i64,
  pub is_correct: bool,
}

impl Answer {
  pub fn new(id: impl Into<String>, question_id: &QuestionId, order: i64, is_correct: bool) -> Self {
    Self {
      id: id.into(),
      question_id: question_id.clone(),
      order,
      is_correct,
    }
  }
}
