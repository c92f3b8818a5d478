//! Stratified selection of matrix slots with three fallback tiers.
//!
//! Each matrix row (one chapter) runs independently and in matrix order:
//! 1. exact outcome rank within the chapter
//! 2. any remaining question of the chapter
//! 3. any remaining question of any chapter (policy controlled)
//!
//! Every tier only works on what the previous one left unmet, and every draw
//! swaps the pool for one without the drawn questions.

use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use super::pool::Pool;
use super::sampler::{weighted_sample, RandomSource};
use super::weight::weigh_all;
use crate::domain::{ChapterId, Diagnostics, MatrixRequirement, Question, QuestionId, Warning, MAX_OUTCOME_RANK};
use crate::error::EngineError;

#[cfg(feature = "profiling")]
use crate::profiling::EventType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
  ExactOutcome,
  Chapter,
  CrossChapter,
}

impl Tier {
  pub fn as_str(&self) -> &'static str {
    match self {
      Tier::ExactOutcome => "exact_outcome",
      Tier::Chapter => "chapter",
      Tier::CrossChapter => "cross_chapter",
    }
  }
}

/// The matrix cell a selected question fills
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotKey {
  pub chapter_id: ChapterId,
  pub rank: u8,
}

impl SlotKey {
  pub fn new(chapter_id: ChapterId, rank: u8) -> Self {
    Self { chapter_id, rank }
  }
}

#[derive(Debug, Clone)]
pub struct SelectedQuestion {
  pub question: Arc<Question>,
  pub slot: SlotKey,
  pub tier: Tier,
}

/// A slot left short after all tiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortfall {
  pub slot: SlotKey,
  pub requested: u32,
  pub obtained: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct SelectionPolicy {
  pub cross_chapter_fallback: bool,
}

impl Default for SelectionPolicy {
  fn default() -> Self {
    Self {
      cross_chapter_fallback: true,
    }
  }
}

#[derive(Debug)]
pub struct Selection {
  pub selected: Vec<SelectedQuestion>,
  pub shortfalls: Vec<Shortfall>,
  /// What is left of the pool after selection
  pub remaining: Pool,
}

impl Selection {
  pub fn len(&self) -> usize {
    self.selected.len()
  }

  pub fn is_empty(&self) -> bool {
    self.selected.is_empty()
  }

  /// Record shortfalls as partial-fulfillment warnings
  pub fn report_shortfalls(&self, diagnostics: &mut Diagnostics) {
    for shortfall in &self.shortfalls {
      diagnostics.record(Warning::PartialFulfillment {
        chapter: shortfall.slot.chapter_id.clone(),
        rank: shortfall.slot.rank,
        requested: shortfall.requested,
        obtained: shortfall.obtained,
      });
    }
  }
}

fn draw(candidates: &[Arc<Question>], k: usize, target: Option<u8>, rng: &mut dyn RandomSource) -> Vec<Arc<Question>> {
  if k == 0 || candidates.is_empty() {
    return Vec::new();
  }
  let weighted = weigh_all(candidates, |q| &**q, target);
  weighted_sample(weighted, k, rng).into_iter().cloned().collect()
}

fn drawn_ids(drawn: &[Arc<Question>]) -> HashSet<QuestionId> {
  drawn.iter().map(|q| q.id.clone()).collect()
}

/// Select questions for every row of `matrix`, each count multiplied by `multiplier`.
///
/// Fails with [`EngineError::EmptyPool`] only when nothing at all was selected.
pub fn select_stratified(
  pool: Pool,
  matrix: &[MatrixRequirement],
  multiplier: u32,
  policy: SelectionPolicy,
  rng: &mut dyn RandomSource,
  diagnostics: &mut Diagnostics,
) -> Result<Selection, EngineError> {
  let mut pool = pool;
  let mut selected = Vec::new();
  let mut shortfalls = Vec::new();

  for row in matrix {
    let chapter_id = &row.chapter_id;
    let requested: [u32; 5] = row.counts().map(|c| c.saturating_mul(multiplier.max(1)));
    let mut need = requested;

    // Tier 1: exact outcome
    for rank in 1..=MAX_OUTCOME_RANK {
      let idx = (rank - 1) as usize;
      if need[idx] == 0 {
        continue;
      }
      let drawn = draw(pool.bucket(chapter_id, rank), need[idx] as usize, Some(rank), rng);
      log_tier(chapter_id, Tier::ExactOutcome, rank, need[idx], drawn.len());
      need[idx] -= drawn.len() as u32;
      pool = pool.without(&drawn_ids(&drawn));
      selected.extend(drawn.into_iter().map(|question| SelectedQuestion {
        question,
        slot: SlotKey::new(chapter_id.clone(), rank),
        tier: Tier::ExactOutcome,
      }));
    }

    // Tier 2: anything left in the chapter
    let unmet = need.iter().fold(0u32, |acc, n| acc.saturating_add(*n));
    if unmet > 0 {
      let drawn = draw(&pool.chapter_questions(chapter_id), unmet as usize, None, rng);
      log_tier(chapter_id, Tier::Chapter, 0, unmet, drawn.len());
      pool = pool.without(&drawn_ids(&drawn));
      attribute(drawn, chapter_id, Tier::Chapter, &mut need, &mut selected);
    }

    // Tier 3: anything left anywhere
    let unmet = need.iter().fold(0u32, |acc, n| acc.saturating_add(*n));
    if unmet > 0 && policy.cross_chapter_fallback {
      let drawn = draw(&pool.all_questions(), unmet as usize, None, rng);
      log_tier(chapter_id, Tier::CrossChapter, 0, unmet, drawn.len());
      if !drawn.is_empty() {
        let sources: BTreeSet<ChapterId> = drawn
          .iter()
          .map(|q| q.chapter_id.clone())
          .filter(|c| c != chapter_id)
          .collect();
        diagnostics.record(Warning::CrossChapterFallback {
          chapter: chapter_id.clone(),
          filled: drawn.len() as u32,
          source_chapters: sources.into_iter().collect(),
        });
      }
      pool = pool.without(&drawn_ids(&drawn));
      attribute(drawn, chapter_id, Tier::CrossChapter, &mut need, &mut selected);
    }

    for rank in 1..=MAX_OUTCOME_RANK {
      let idx = (rank - 1) as usize;
      if need[idx] > 0 {
        shortfalls.push(Shortfall {
          slot: SlotKey::new(chapter_id.clone(), rank),
          requested: requested[idx],
          obtained: requested[idx] - need[idx],
        });
      }
    }
  }

  if selected.is_empty() {
    return Err(EngineError::EmptyPool {
      chapters: matrix.iter().map(|r| r.chapter_id.clone()).collect(),
    });
  }

  tracing::info!(
    "Selected {} questions ({} slots short)",
    selected.len(),
    shortfalls.len()
  );

  Ok(Selection {
    selected,
    shortfalls,
    remaining: pool,
  })
}

/// Fallback draws fill the lowest unmet rank first
fn attribute(
  drawn: Vec<Arc<Question>>,
  chapter_id: &ChapterId,
  tier: Tier,
  need: &mut [u32; 5],
  selected: &mut Vec<SelectedQuestion>,
) {
  for question in drawn {
    let Some(idx) = need.iter().position(|n| *n > 0) else {
      break;
    };
    need[idx] -= 1;
    selected.push(SelectedQuestion {
      question,
      slot: SlotKey::new(chapter_id.clone(), idx as u8 + 1),
      tier,
    });
  }
}

fn log_tier(chapter_id: &ChapterId, tier: Tier, rank: u8, requested: u32, drawn: usize) {
  tracing::debug!(
    "Chapter {} {} (CLO {}): requested {}, drew {}",
    chapter_id,
    tier.as_str(),
    rank,
    requested,
    drawn
  );

  #[cfg(feature = "profiling")]
  crate::profile_log!(EventType::TierDraw {
    chapter: chapter_id.to_string(),
    tier: tier.as_str().into(),
    rank,
    requested: requested as i64,
    drawn: drawn as i64,
  });
}
