//! Matrix requirements and generation requests.

use serde::{Deserialize, Serialize};

use super::question::{ChapterId, MAX_OUTCOME_RANK};

/// How many questions one chapter must contribute, per outcome rank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixRequirement {
  #[serde(alias = "chapter")]
  pub chapter_id: ChapterId,
  #[serde(default)]
  pub clo1: u32,
  #[serde(default)]
  pub clo2: u32,
  #[serde(default)]
  pub clo3: u32,
  #[serde(default)]
  pub clo4: u32,
  #[serde(default)]
  pub clo5: u32,
}

impl MatrixRequirement {
  pub fn new(chapter_id: impl Into<String>, counts: [u32; 5]) -> Self {
    let [clo1, clo2, clo3, clo4, clo5] = counts;
    Self {
      chapter_id: ChapterId::new(chapter_id),
      clo1,
      clo2,
      clo3,
      clo4,
      clo5,
    }
  }

  /// Counts indexed by `rank - 1`
  pub fn counts(&self) -> [u32; 5] {
    [self.clo1, self.clo2, self.clo3, self.clo4, self.clo5]
  }

  /// Requested count for a rank (0 for ranks outside 1..=5)
  pub fn count_for(&self, rank: u8) -> u32 {
    if (1..=MAX_OUTCOME_RANK).contains(&rank) {
      self.counts()[(rank - 1) as usize]
    } else {
      0
    }
  }

  /// Sum of the five counts, `None` if it does not fit a `u32`
  pub fn total(&self) -> Option<u32> {
    self.counts().iter().try_fold(0u32, |acc, c| acc.checked_add(*c))
  }

  fn checked_add(&self, other: &MatrixRequirement) -> Option<MatrixRequirement> {
    Some(MatrixRequirement {
      chapter_id: self.chapter_id.clone(),
      clo1: self.clo1.checked_add(other.clo1)?,
      clo2: self.clo2.checked_add(other.clo2)?,
      clo3: self.clo3.checked_add(other.clo3)?,
      clo4: self.clo4.checked_add(other.clo4)?,
      clo5: self.clo5.checked_add(other.clo5)?,
    })
  }
}

/// Merge rows naming the same chapter, keeping first-occurrence order.
///
/// `None` when a merged count overflows.
pub fn normalize_matrix(matrix: &[MatrixRequirement]) -> Option<Vec<MatrixRequirement>> {
  let mut merged: Vec<MatrixRequirement> = Vec::with_capacity(matrix.len());
  for row in matrix {
    match merged.iter_mut().find(|m| m.chapter_id == row.chapter_id) {
      Some(existing) => *existing = existing.checked_add(row)?,
      None => merged.push(row.clone()),
    }
  }
  Some(merged)
}

/// Total number of top-level questions a single exam asks for, `None` on overflow
pub fn matrix_total(matrix: &[MatrixRequirement]) -> Option<u32> {
  matrix.iter().try_fold(0u32, |acc, row| acc.checked_add(row.total()?))
}

fn default_variant_count() -> u32 {
  1
}

/// A request to generate one or more exam variants from a matrix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamRequest {
  /// Caller-supplied title/owner tag, carried through untouched
  #[serde(default)]
  pub label: String,
  #[serde(default = "default_variant_count")]
  pub variant_count: u32,
  pub matrix: Vec<MatrixRequirement>,
}

impl ExamRequest {
  pub fn new(label: impl Into<String>, matrix: Vec<MatrixRequirement>) -> Self {
    Self {
      label: label.into(),
      variant_count: 1,
      matrix,
    }
  }

  pub fn with_variants(mut self, variant_count: u32) -> Self {
    self.variant_count = variant_count;
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_counts_and_total() {
    let row = MatrixRequirement::new("C1", [2, 1, 0, 0, 3]);
    assert_eq!(row.counts(), [2, 1, 0, 0, 3]);
    assert_eq!(row.total(), Some(6));
    assert_eq!(row.count_for(1), 2);
    assert_eq!(row.count_for(5), 3);
    assert_eq!(row.count_for(0), 0);
    assert_eq!(row.count_for(6), 0);
  }

  #[test]
  fn test_total_overflow_is_none() {
    let row = MatrixRequirement::new("C1", [u32::MAX, 1, 0, 0, 0]);
    assert_eq!(row.total(), None);

    let matrix = vec![
      MatrixRequirement::new("C1", [u32::MAX, 0, 0, 0, 0]),
      MatrixRequirement::new("C2", [1, 0, 0, 0, 0]),
    ];
    assert_eq!(matrix_total(&matrix), None);
  }

  #[test]
  fn test_normalize_rejects_overflowing_merge() {
    let matrix = vec![
      MatrixRequirement::new("C1", [u32::MAX, 0, 0, 0, 0]),
      MatrixRequirement::new("C1", [1, 0, 0, 0, 0]),
    ];
    assert_eq!(normalize_matrix(&matrix), None);
  }

  #[test]
  fn test_normalize_merges_duplicate_chapters() {
    let matrix = vec![
      MatrixRequirement::new("C1", [1, 0, 0, 0, 0]),
      MatrixRequirement::new("C2", [0, 2, 0, 0, 0]),
      MatrixRequirement::new("C1", [1, 1, 0, 0, 0]),
    ];
    let merged = normalize_matrix(&matrix).unwrap();
    assert_eq!(merged.len(), 2);
    assert_eq!(merged[0].chapter_id.as_str(), "C1");
    assert_eq!(merged[0].counts(), [2, 1, 0, 0, 0]);
    assert_eq!(merged[1].chapter_id.as_str(), "C2");
    assert_eq!(matrix_total(&merged), Some(5));
  }

  #[test]
  fn test_request_json_defaults() {
    let json = r#"{"matrix": [{"chapter": "C1", "clo1": 2, "clo2": 1}]}"#;
    let request: ExamRequest = serde_json::from_str(json).unwrap();
    assert_eq!(request.variant_count, 1);
    assert_eq!(request.label, "");
    assert_eq!(request.matrix[0].counts(), [2, 1, 0, 0, 0]);
  }
}
