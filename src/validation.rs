//! Integrity checks over generated exams.
//!
//! - duplicate questions inside one variant (always an error)
//! - questions shared between variants (an error for a clean distribution)
//! - empty variants and uneven variant sizes (warnings)

use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Write;
use std::hash::Hash;

use crate::domain::{AllocationEntry, ChapterId, ExamVariant, Question, QuestionId};

/// Variant sizes further apart than this are reported as uneven
pub const MAX_SIZE_SPREAD: usize = 2;

// ============================================================================
// Duplicate checks
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DuplicateCheck {
  /// Every repeated occurrence, in encounter order
  pub duplicate_ids: Vec<QuestionId>,
  pub unique_count: usize,
}

impl DuplicateCheck {
  pub fn has_duplicates(&self) -> bool {
    !self.duplicate_ids.is_empty()
  }

  pub fn duplicate_count(&self) -> usize {
    self.duplicate_ids.len()
  }
}

pub fn check_duplicates<'a>(ids: impl IntoIterator<Item = &'a QuestionId>) -> DuplicateCheck {
  let mut seen = HashSet::new();
  let mut duplicate_ids = Vec::new();
  for id in ids {
    if !seen.insert(id) {
      duplicate_ids.push(id.clone());
    }
  }
  DuplicateCheck {
    duplicate_ids,
    unique_count: seen.len(),
  }
}

/// Keep the first item for every key
pub fn remove_duplicates<T, K, F>(items: Vec<T>, key: F) -> Vec<T>
where
  K: Eq + Hash,
  F: Fn(&T) -> K,
{
  let before = items.len();
  let mut seen = HashSet::new();
  let unique: Vec<T> = items.into_iter().filter(|item| seen.insert(key(item))).collect();

  let removed = before - unique.len();
  if removed > 0 {
    tracing::warn!("Removed {} duplicate questions", removed);
  }
  unique
}

/// A single exam is valid when no question repeats
pub fn is_valid_exam(variant: &ExamVariant) -> bool {
  !check_duplicates(variant.question_ids()).has_duplicates()
}

// ============================================================================
// Distribution report
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DistributionStats {
  pub total_variants: usize,
  /// Unique questions per variant
  pub questions_per_variant: Vec<usize>,
  pub total_unique_questions: usize,
  /// Occurrences of a question in a variant after the first variant holding it
  pub overlap_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DistributionReport {
  pub errors: Vec<String>,
  pub warnings: Vec<String>,
  pub stats: DistributionStats,
  /// Per-variant duplicate checks, indexed like the variants
  pub variants: Vec<DuplicateCheck>,
}

impl DistributionReport {
  pub fn is_valid(&self) -> bool {
    self.errors.is_empty()
  }

  /// One-line summary for logs
  pub fn summary(&self) -> String {
    format!(
      "{} variants, {} unique questions, {} overlaps, {}",
      self.stats.total_variants,
      self.stats.total_unique_questions,
      self.stats.overlap_count,
      if self.is_valid() { "valid" } else { "INVALID" }
    )
  }

  /// Plain-text integrity report
  pub fn render(&self) -> String {
    let mut report = String::from("=== EXAM INTEGRITY REPORT ===\n\n");

    let sizes: Vec<String> = self.stats.questions_per_variant.iter().map(|n| n.to_string()).collect();
    let _ = writeln!(report, "SUMMARY:");
    let _ = writeln!(report, "- Total variants: {}", self.stats.total_variants);
    let _ = writeln!(report, "- Total unique questions: {}", self.stats.total_unique_questions);
    let _ = writeln!(report, "- Questions per variant: {}", sizes.join(", "));
    let _ = writeln!(report, "- Status: {}\n", if self.is_valid() { "VALID" } else { "INVALID" });

    if !self.errors.is_empty() {
      let _ = writeln!(report, "ERRORS ({}):", self.errors.len());
      for (i, error) in self.errors.iter().enumerate() {
        let _ = writeln!(report, "{}. {}", i + 1, error);
      }
      report.push('\n');
    }

    if !self.warnings.is_empty() {
      let _ = writeln!(report, "WARNINGS ({}):", self.warnings.len());
      for (i, warning) in self.warnings.iter().enumerate() {
        let _ = writeln!(report, "{}. {}", i + 1, warning);
      }
      report.push('\n');
    }

    let _ = writeln!(report, "DETAILED BREAKDOWN:");
    for (i, check) in self.variants.iter().enumerate() {
      let _ = write!(report, "Variant {}: {} unique questions", i + 1, check.unique_count);
      if check.has_duplicates() {
        let _ = write!(report, " ({} duplicates)", check.duplicate_count());
      }
      report.push('\n');
    }

    if self.stats.overlap_count > 0 {
      let _ = writeln!(
        report,
        "\nOVERLAP: {} questions appear in multiple variants",
        self.stats.overlap_count
      );
    }

    report.push_str("\n=== END REPORT ===");
    report
  }
}

/// Check a set of variants for duplicates, overlap and balance
pub fn validate_distribution(variants: &[ExamVariant]) -> DistributionReport {
  let mut report = DistributionReport::default();
  // question -> first variant holding it
  let mut owner: HashMap<&QuestionId, usize> = HashMap::new();

  for (i, variant) in variants.iter().enumerate() {
    let check = check_duplicates(variant.question_ids());
    if check.has_duplicates() {
      let ids: Vec<&str> = check.duplicate_ids.iter().map(QuestionId::as_str).collect();
      report.errors.push(format!(
        "Variant {} has {} duplicate questions: {}",
        i + 1,
        check.duplicate_count(),
        ids.join(", ")
      ));
    }
    report.stats.questions_per_variant.push(check.unique_count);

    let mut counted = HashSet::new();
    for id in variant.question_ids() {
      if !counted.insert(id) {
        continue;
      }
      match owner.get(id) {
        Some(first) if *first != i => {
          report.stats.overlap_count += 1;
          report.errors.push(format!(
            "Question {} appears in variants {} and {}",
            id,
            first + 1,
            i + 1
          ));
        }
        Some(_) => {}
        None => {
          owner.insert(id, i);
        }
      }
    }

    if variant.entries.is_empty() {
      report.warnings.push(format!("Variant {} has no questions", i + 1));
    }
    report.variants.push(check);
  }

  let sizes = &report.stats.questions_per_variant;
  if sizes.len() > 1 {
    let min = sizes.iter().copied().min().unwrap_or(0);
    let max = sizes.iter().copied().max().unwrap_or(0);
    if max - min > MAX_SIZE_SPREAD {
      report
        .warnings
        .push(format!("Uneven question distribution: {}-{} questions per variant", min, max));
    }
  }

  report.stats.total_variants = variants.len();
  report.stats.total_unique_questions = owner.len();
  report
}

// ============================================================================
// Histograms
// ============================================================================

/// Questions per outcome rank (0 = no outcome)
pub fn outcome_distribution(questions: &[Question]) -> BTreeMap<u8, usize> {
  let mut distribution = BTreeMap::new();
  for question in questions {
    *distribution.entry(question.known_rank().unwrap_or(0)).or_insert(0) += 1;
  }
  distribution
}

/// Entries per chapter
pub fn chapter_distribution(entries: &[AllocationEntry]) -> BTreeMap<ChapterId, usize> {
  let mut distribution = BTreeMap::new();
  for entry in entries {
    *distribution.entry(entry.chapter_id.clone()).or_insert(0) += 1;
  }
  distribution
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::ranked;

  fn variant(index: usize, ids: &[&str]) -> ExamVariant {
    ExamVariant {
      index,
      entries: ids
        .iter()
        .enumerate()
        .map(|(i, id)| AllocationEntry {
          variant: index,
          chapter_id: ChapterId::new("C1"),
          question_id: QuestionId::new(*id),
          position: i as u32 + 1,
          group_parent: None,
        })
        .collect(),
      warnings: Vec::new(),
    }
  }

  #[test]
  fn test_check_duplicates() {
    let ids: Vec<QuestionId> = ["A", "B", "A", "C", "A"].into_iter().map(QuestionId::new).collect();
    let check = check_duplicates(&ids);
    assert!(check.has_duplicates());
    assert_eq!(check.duplicate_count(), 2);
    assert_eq!(check.unique_count, 3);
  }

  #[test]
  fn test_remove_duplicates_keeps_first() {
    let items = vec![("A", 1), ("B", 2), ("A", 3)];
    let unique = remove_duplicates(items, |(id, _)| *id);
    assert_eq!(unique, vec![("A", 1), ("B", 2)]);
  }

  #[test]
  fn test_clean_distribution_is_valid() {
    let variants = vec![variant(0, &["A", "B"]), variant(1, &["C", "D"])];
    let report = validate_distribution(&variants);
    assert!(report.is_valid());
    assert!(report.warnings.is_empty());
    assert_eq!(report.stats.total_unique_questions, 4);
    assert_eq!(report.stats.questions_per_variant, vec![2, 2]);
    assert!(is_valid_exam(&variants[0]));
  }

  #[test]
  fn test_overlap_is_an_error() {
    let variants = vec![variant(0, &["A", "B"]), variant(1, &["B", "C"]), variant(2, &["A", "D"])];
    let report = validate_distribution(&variants);
    assert!(!report.is_valid());
    assert_eq!(report.stats.overlap_count, 2);
    assert_eq!(report.stats.total_unique_questions, 4);
    assert!(report.errors[0].contains("Question B appears in variants 1 and 2"));
    assert!(report.render().contains("OVERLAP: 2 questions"));
  }

  #[test]
  fn test_intra_variant_duplicate() {
    let variants = vec![variant(0, &["A", "A", "B"])];
    let report = validate_distribution(&variants);
    assert_eq!(report.errors, vec!["Variant 1 has 1 duplicate questions: A".to_string()]);
    assert_eq!(report.stats.overlap_count, 0);
    assert!(!is_valid_exam(&variants[0]));
  }

  #[test]
  fn test_empty_and_uneven_variants_warn() {
    let variants = vec![variant(0, &["A", "B", "C", "D"]), variant(1, &[])];
    let report = validate_distribution(&variants);
    assert!(report.is_valid());
    assert_eq!(
      report.warnings,
      vec![
        "Variant 2 has no questions".to_string(),
        "Uneven question distribution: 0-4 questions per variant".to_string(),
      ]
    );
  }

  #[test]
  fn test_render_layout() {
    let report = validate_distribution(&[variant(0, &["A"])]);
    let text = report.render();
    assert!(text.starts_with("=== EXAM INTEGRITY REPORT ==="));
    assert!(text.contains("- Status: VALID"));
    assert!(text.contains("Variant 1: 1 unique questions"));
    assert!(text.ends_with("=== END REPORT ==="));
    assert_eq!(report.summary(), "1 variants, 1 unique questions, 0 overlaps, valid");
  }

  #[test]
  fn test_histograms() {
    let questions = vec![ranked("A", "C1", 1), ranked("B", "C1", 1), ranked("C", "C2", 0)];
    let outcomes = outcome_distribution(&questions);
    assert_eq!(outcomes.get(&1), Some(&2));
    assert_eq!(outcomes.get(&0), Some(&1));

    let v = variant(0, &["A", "B"]);
    let chapters = chapter_distribution(&v.entries);
    assert_eq!(chapters.get(&ChapterId::new("C1")), Some(&2));
  }
}
