//! Splits an over-provisioned selection across several exam variants.
//!
//! Candidates are grouped by the slot they were selected for. Each slot hands
//! every variant its own block of `R` items when there are at least `R * V`
//! of them; below that, variants share questions and the overlap is reported.

use std::collections::{BTreeMap, HashSet};

use super::sampler::{shuffle, RandomSource};
use super::stratified::SlotKey;
use crate::domain::{Diagnostics, MatrixRequirement, QuestionId, Warning, MAX_OUTCOME_RANK};
use crate::groups::ExpandedItem;

#[cfg(feature = "profiling")]
use crate::profiling::EventType;

/// Items and diagnostics for one variant, before positions are assigned
#[derive(Debug, Default)]
pub struct VariantPlan {
  pub index: usize,
  pub items: Vec<ExpandedItem>,
  pub diagnostics: Diagnostics,
}

impl VariantPlan {
  fn new(index: usize) -> Self {
    Self {
      index,
      ..Default::default()
    }
  }

  fn holds(&self, id: &QuestionId) -> bool {
    self.items.iter().any(|item| item.id() == id)
  }
}

/// Partition `items` over `variant_count` variants following `matrix` order
pub fn distribute(
  items: Vec<ExpandedItem>,
  matrix: &[MatrixRequirement],
  variant_count: usize,
  rng: &mut dyn RandomSource,
) -> Vec<VariantPlan> {
  let mut variants: Vec<VariantPlan> = (0..variant_count).map(VariantPlan::new).collect();
  if variant_count == 0 {
    return variants;
  }

  let mut by_slot: BTreeMap<SlotKey, Vec<ExpandedItem>> = BTreeMap::new();
  for item in items {
    by_slot.entry(item.selected.slot.clone()).or_default().push(item);
  }

  for row in matrix {
    for rank in 1..=MAX_OUTCOME_RANK {
      let per_variant = row.count_for(rank) as usize;
      if per_variant == 0 {
        continue;
      }
      let slot = SlotKey::new(row.chapter_id.clone(), rank);
      let mut candidates = by_slot.remove(&slot).unwrap_or_default();
      let required = per_variant.saturating_mul(variant_count);
      let available = candidates.len();

      tracing::debug!(
        "Distributing chapter {} CLO {}: {} candidates for {} variants x {}",
        slot.chapter_id,
        rank,
        available,
        variant_count,
        per_variant
      );

      #[cfg(feature = "profiling")]
      crate::profile_log!(EventType::Distribution {
        chapter: slot.chapter_id.to_string(),
        rank,
        required: required as i64,
        available: available as i64,
      });

      if available == 0 {
        for variant in &mut variants {
          variant.diagnostics.record(Warning::MissingCandidates {
            chapter: slot.chapter_id.clone(),
            rank,
            requested: per_variant as u32,
          });
        }
        continue;
      }

      shuffle(&mut candidates, rng);

      if available >= required {
        for (v, variant) in variants.iter_mut().enumerate() {
          let block = &candidates[v * per_variant..(v + 1) * per_variant];
          variant.items.extend(block.iter().cloned());
        }
        continue;
      }

      share_scarce(&slot, &candidates, per_variant, &mut variants);
    }
  }

  variants
}

/// Degraded split: each variant walks the shuffled candidates cyclically
/// from its own offset, so overlap is spread rather than piled on one variant.
fn share_scarce(slot: &SlotKey, candidates: &[ExpandedItem], per_variant: usize, variants: &mut [VariantPlan]) {
  let available = candidates.len();
  let required = per_variant.saturating_mul(variants.len());
  let wanted = per_variant.min(available);
  let mut taken_by: Vec<Vec<usize>> = vec![Vec::new(); available];

  for (v, variant) in variants.iter_mut().enumerate() {
    let mut got = 0;
    for step in 0..available {
      if got == wanted {
        break;
      }
      let idx = (v * per_variant + step) % available;
      let item = &candidates[idx];
      if variant.holds(item.id()) {
        continue;
      }
      variant.items.push(item.clone());
      taken_by[idx].push(v);
      got += 1;
    }

    if got < per_variant {
      variant.diagnostics.record(Warning::PartialFulfillment {
        chapter: slot.chapter_id.clone(),
        rank: slot.rank,
        requested: per_variant as u32,
        obtained: got as u32,
      });
    }
  }

  let affected: HashSet<usize> = taken_by
    .iter()
    .filter(|holders| holders.len() > 1)
    .flatten()
    .copied()
    .collect();
  let mut affected: Vec<usize> = affected.into_iter().collect();
  affected.sort_unstable();

  let warning = Warning::DistributionShortfall {
    chapter: slot.chapter_id.clone(),
    rank: slot.rank,
    required: required as u32,
    available: available as u32,
    shortfall: (required - available) as u32,
    affected_variants: affected.clone(),
  };
  for v in affected {
    variants[v].diagnostics.record(warning.clone());
  }
}
