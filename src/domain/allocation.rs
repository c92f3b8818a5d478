use serde::{Deserialize, Serialize};

use super::diagnostics::Warning;
use super::question::{ChapterId, QuestionId};

/// One question placed at one position of one variant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationEntry {
  /// 0-based variant index
  pub variant: usize,
  pub chapter_id: ChapterId,
  pub question_id: QuestionId,
  /// 1-based, contiguous within a variant
  pub position: u32,
  /// Set on group children, pointing at the parent placed just before them
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub group_parent: Option<QuestionId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamVariant {
  pub index: usize,
  pub entries: Vec<AllocationEntry>,
  pub warnings: Vec<Warning>,
}

impl ExamVariant {
  pub fn question_ids(&self) -> Vec<&QuestionId> {
    self.entries.iter().map(|e| &e.question_id).collect()
  }

  /// Entries that are not group children
  pub fn top_level_count(&self) -> usize {
    self.entries.iter().filter(|e| e.group_parent.is_none()).count()
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutput {
  #[serde(default)]
  pub label: String,
  pub variants: Vec<ExamVariant>,
}

impl GenerationOutput {
  pub fn total_entries(&self) -> usize {
    self.variants.iter().map(|v| v.entries.len()).sum()
  }

  pub fn has_warnings(&self) -> bool {
    self.variants.iter().any(|v| !v.warnings.is_empty())
  }
}
