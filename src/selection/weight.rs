//! Selection weight for a bank question.
//!
//! Weights prioritize:
//! - Questions that have been administered rarely or never
//! - Questions whose observed difficulty (or success rate) sits near the target
//! - Questions tagged with the learning outcome being filled
//! - Questions with a full answer set and real content

use crate::domain::Question;

pub const MIN_WEIGHT: f64 = 0.1;
pub const MAX_WEIGHT: f64 = 10.0;

/// Observed difficulty that scores best
const IDEAL_OBSERVED_DIFFICULTY: f64 = 0.6;
/// Historical success rate that scores best
const IDEAL_SUCCESS_RATE: f64 = 0.7;
/// Calibration factor lost per unit of distance from the ideal
const CALIBRATION_SLOPE: f64 = 2.0;
const CALIBRATION_FLOOR: f64 = 0.3;

/// A question paired with its selection weight
#[derive(Debug, Clone)]
pub struct QuestionWeight<T> {
  pub item: T,
  pub weight: f64,
}

/// Calculate the selection weight for a question, optionally against a target outcome rank
pub fn question_weight(question: &Question, target_rank: Option<u8>) -> f64 {
  let mut weight = 1.0;

  // Factor 1: Usage (never used = highest)
  weight *= usage_factor(question.times_administered);

  // Factor 2: Calibration quality
  // Peaks at 1.0 near the ideal, falls off linearly, floored at 0.3
  weight *= match (question.observed_difficulty, question.success_rate()) {
    (Some(observed), _) => calibration_factor(observed, IDEAL_OBSERVED_DIFFICULTY),
    (None, Some(rate)) => calibration_factor(rate, IDEAL_SUCCESS_RATE),
    (None, None) => 0.8,
  };

  // Factor 3: Declared difficulty, only trusted without observed data
  if question.observed_difficulty.is_none() {
    weight *= match question.difficulty_level {
      3 | 4 => 1.2,
      2 | 5 => 1.0,
      1 => 0.8,
      _ => 1.0,
    };
  }

  // Factor 4: Outcome match
  if let Some(target) = target_rank {
    weight *= outcome_factor(question, target);
  }

  // Factor 5: Answer richness
  weight *= match question.answer_count {
    n if n >= 4 => 1.3,
    3 => 1.1,
    2 => 0.8,
    _ => 0.3,
  };

  // Factor 6: Content substance
  let content_len = question.content.chars().count();
  if content_len > 50 {
    weight *= 1.1;
  } else if content_len < 10 {
    weight *= 0.7;
  }

  // Factor 7: Group parents pull extra children in
  if question.is_group_parent() {
    weight *= 0.9;
  }

  clamp_weight(weight)
}

fn usage_factor(times_administered: i64) -> f64 {
  match times_administered {
    n if n <= 0 => 1.5,
    1 => 1.3,
    n => 1.0 / (2.0 + n as f64).log2(),
  }
}

fn calibration_factor(value: f64, ideal: f64) -> f64 {
  (1.0 - CALIBRATION_SLOPE * (value - ideal).abs()).max(CALIBRATION_FLOOR)
}

fn outcome_factor(question: &Question, target: u8) -> f64 {
  match question.known_rank() {
    Some(rank) if rank == target => 3.0,
    Some(rank) => {
      let distance = (rank as f64 - target as f64).abs();
      (1.0 - 0.3 * distance).max(0.2)
    }
    None => 0.1,
  }
}

fn clamp_weight(weight: f64) -> f64 {
  if weight.is_finite() {
    weight.clamp(MIN_WEIGHT, MAX_WEIGHT)
  } else {
    MIN_WEIGHT
  }
}

/// Weigh every question against the same target
pub fn weigh_all<'a, T, F>(items: &'a [T], question: F, target_rank: Option<u8>) -> Vec<QuestionWeight<&'a T>>
where
  F: Fn(&T) -> &Question,
{
  items
    .iter()
    .map(|item| QuestionWeight {
      item,
      weight: question_weight(question(item), target_rank),
    })
    .collect()
}
