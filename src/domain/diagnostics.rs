//! Recoverable conditions collected during a generation run.
//!
//! Nothing in here aborts a run. Each [`Warning`] is recorded into a
//! [`Diagnostics`] collector, which also emits a `tracing` event at the
//! matching level, and is handed back to the caller alongside the allocation.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::question::{ChapterId, QuestionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Info,
  Warning,
  Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
  /// A chapter/rank slot got fewer questions than requested
  PartialFulfillment {
    chapter: ChapterId,
    rank: u8,
    requested: u32,
    obtained: u32,
  },
  /// A group parent's declared child count disagrees with the bank
  GroupIntegrityMismatch {
    parent: QuestionId,
    chapter: ChapterId,
    declared: u32,
    actual: u32,
    /// True when the strict policy dropped the whole group
    rejected: bool,
  },
  /// Not enough candidates to keep variants disjoint for a key
  DistributionShortfall {
    chapter: ChapterId,
    rank: u8,
    required: u32,
    available: u32,
    shortfall: u32,
    affected_variants: Vec<usize>,
  },
  /// No candidate at all for a key; affected variants get nothing for it
  MissingCandidates {
    chapter: ChapterId,
    rank: u8,
    requested: u32,
  },
  /// Tier 3 pulled questions from other chapters into this chapter's slots
  CrossChapterFallback {
    chapter: ChapterId,
    filled: u32,
    source_chapters: Vec<ChapterId>,
  },
  /// The fresh pool was too small and the expanded recency window was used
  RecencyWindowExpanded {
    fresh: u32,
    demand: u32,
    added: u32,
  },
}

impl Warning {
  pub fn severity(&self) -> Severity {
    match self {
      Warning::MissingCandidates { .. } => Severity::Error,
      Warning::RecencyWindowExpanded { .. } => Severity::Info,
      Warning::PartialFulfillment { .. }
      | Warning::GroupIntegrityMismatch { .. }
      | Warning::DistributionShortfall { .. }
      | Warning::CrossChapterFallback { .. } => Severity::Warning,
    }
  }
}

impl fmt::Display for Warning {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Warning::PartialFulfillment {
        chapter,
        rank,
        requested,
        obtained,
      } => write!(
        f,
        "Chapter {} CLO {}: requested {}, obtained {}",
        chapter, rank, requested, obtained
      ),
      Warning::GroupIntegrityMismatch {
        parent,
        declared,
        actual,
        rejected,
        ..
      } => {
        write!(
          f,
          "Group question {} declares {} children but {} were found",
          parent, declared, actual
        )?;
        if *rejected {
          write!(f, " (group rejected)")?;
        }
        Ok(())
      }
      Warning::DistributionShortfall {
        chapter,
        rank,
        required,
        available,
        shortfall,
        affected_variants,
      } => {
        let variants: Vec<String> = affected_variants.iter().map(|v| (v + 1).to_string()).collect();
        write!(
          f,
          "Chapter {} CLO {}: {} needed across variants, {} available (short by {}); variants {} share questions",
          chapter,
          rank,
          required,
          available,
          shortfall,
          variants.join(", ")
        )
      }
      Warning::MissingCandidates {
        chapter,
        rank,
        requested,
      } => write!(
        f,
        "Chapter {} CLO {}: no questions available for {} requested",
        chapter, rank, requested
      ),
      Warning::CrossChapterFallback {
        chapter,
        filled,
        source_chapters,
      } => {
        let sources: Vec<&str> = source_chapters.iter().map(ChapterId::as_str).collect();
        write!(
          f,
          "Chapter {}: {} questions taken from other chapters ({})",
          chapter,
          filled,
          sources.join(", ")
        )
      }
      Warning::RecencyWindowExpanded { fresh, demand, added } => write!(
        f,
        "Fresh pool of {} questions is small for a demand of {}; added {} from the expanded window",
        fresh, demand, added
      ),
    }
  }
}

/// Collector for per-run diagnostics
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
  warnings: Vec<Warning>,
}

impl Diagnostics {
  pub fn new() -> Self {
    Self::default()
  }

  /// Record a warning and log it at its severity
  pub fn record(&mut self, warning: Warning) {
    match warning.severity() {
      Severity::Info => tracing::info!("{}", warning),
      Severity::Warning => tracing::warn!("{}", warning),
      Severity::Error => tracing::error!("{}", warning),
    }
    self.warnings.push(warning);
  }

  pub fn extend(&mut self, other: Diagnostics) {
    self.warnings.extend(other.warnings);
  }

  pub fn warnings(&self) -> &[Warning] {
    &self.warnings
  }

  pub fn into_warnings(self) -> Vec<Warning> {
    self.warnings
  }

  pub fn is_empty(&self) -> bool {
    self.warnings.is_empty()
  }

  pub fn len(&self) -> usize {
    self.warnings.len()
  }

  pub fn has_errors(&self) -> bool {
    self.warnings.iter().any(|w| w.severity() == Severity::Error)
  }
}
