//! Weighted sampling without replacement over an injectable random source.

use rand::Rng;

use super::weight::QuestionWeight;

/// The single source of randomness used by selection and distribution.
///
/// Every `rand` generator implements it, so a seeded `StdRng` makes a run
/// reproducible.
pub trait RandomSource {
  /// Uniform value in `[0, 1)`
  fn next_unit(&mut self) -> f64;

  /// Uniform index in `0..upper`; `upper` must be non-zero
  fn next_index(&mut self, upper: usize) -> usize;
}

impl<R: rand::RngCore> RandomSource for R {
  fn next_unit(&mut self) -> f64 {
    self.random::<f64>()
  }

  fn next_index(&mut self, upper: usize) -> usize {
    self.random_range(0..upper)
  }
}

/// Fisher-Yates shuffle driven by a [`RandomSource`]
pub fn shuffle<T>(items: &mut [T], rng: &mut dyn RandomSource) {
  for i in (1..items.len()).rev() {
    let j = rng.next_index(i + 1);
    items.swap(i, j);
  }
}

fn usable(weight: f64) -> f64 {
  if weight.is_finite() && weight > 0.0 { weight } else { 0.0 }
}

/// Draw up to `k` distinct items, each draw proportional to the weight of what remains.
///
/// Asking for more than available returns everything. Once the remaining
/// weight is exhausted the rest is taken in shuffled order.
pub fn weighted_sample<T>(candidates: Vec<QuestionWeight<T>>, k: usize, rng: &mut dyn RandomSource) -> Vec<T> {
  let k = k.min(candidates.len());
  let mut remaining: Vec<(T, f64)> = candidates
    .into_iter()
    .map(|c| (c.item, usable(c.weight)))
    .collect();
  let mut chosen = Vec::with_capacity(k);

  while chosen.len() < k {
    let total: f64 = remaining.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
      // Fallback to uniform if weights are invalid
      shuffle(&mut remaining, rng);
      let needed = k - chosen.len();
      chosen.extend(remaining.drain(..needed).map(|(item, _)| item));
      break;
    }

    let target = rng.next_unit() * total;
    let mut cumulative = 0.0;
    let mut hit = None;
    for (idx, (_, w)) in remaining.iter().enumerate() {
      cumulative += w;
      if target < cumulative {
        hit = Some(idx);
        break;
      }
    }

    // Rounding can leave the target just past the last bucket
    let idx = hit.unwrap_or_else(|| {
      remaining
        .iter()
        .rposition(|(_, w)| *w > 0.0)
        .unwrap_or(remaining.len() - 1)
    });
    let (item, _) = remaining.remove(idx);
    chosen.push(item);
  }

  chosen
}
