//! Turns per-variant item lists into positioned allocation entries.

use crate::domain::{AllocationEntry, Diagnostics, ExamVariant};
use crate::groups::ExpandedItem;
use crate::selection::VariantPlan;

/// Entries for one variant: positions from 1, each parent directly followed by its children
pub fn assemble_entries(variant: usize, items: &[ExpandedItem]) -> Vec<AllocationEntry> {
  let mut entries = Vec::with_capacity(items.iter().map(ExpandedItem::entry_count).sum());
  let mut position = 0u32;

  for item in items {
    let parent = &item.selected.question;
    position += 1;
    entries.push(AllocationEntry {
      variant,
      chapter_id: parent.chapter_id.clone(),
      question_id: parent.id.clone(),
      position,
      group_parent: None,
    });

    for child in &item.children {
      position += 1;
      entries.push(AllocationEntry {
        variant,
        chapter_id: child.chapter_id.clone(),
        question_id: child.id.clone(),
        position,
        group_parent: Some(parent.id.clone()),
      });
    }
  }

  entries
}

pub fn assemble_variant(index: usize, items: &[ExpandedItem], diagnostics: Diagnostics) -> ExamVariant {
  ExamVariant {
    index,
    entries: assemble_entries(index, items),
    warnings: diagnostics.into_warnings(),
  }
}

pub fn assemble_plans(plans: Vec<VariantPlan>) -> Vec<ExamVariant> {
  plans
    .into_iter()
    .map(|plan| assemble_variant(plan.index, &plan.items, plan.diagnostics))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{ChapterId, Question, QuestionId};
  use crate::selection::{SelectedQuestion, SlotKey, Tier};
  use crate::testing::{child_of, group_parent, ranked};
  use std::sync::Arc;

  fn item(question: Question, children: Vec<Question>) -> ExpandedItem {
    ExpandedItem {
      selected: SelectedQuestion {
        slot: SlotKey::new(question.chapter_id.clone(), 1),
        question: Arc::new(question),
        tier: Tier::ExactOutcome,
      },
      children,
    }
  }

  #[test]
  fn test_positions_are_contiguous_with_children_after_parent() {
    let parent = group_parent("P", "C1", 1, 2);
    let c1 = child_of("P-1", &parent, Some(1));
    let c2 = child_of("P-2", &parent, Some(2));
    let items = vec![
      item(ranked("Q1", "C1", 1), vec![]),
      item(parent, vec![c1, c2]),
      item(ranked("Q2", "C2", 1), vec![]),
    ];

    let entries = assemble_entries(0, &items);

    let order: Vec<(&str, u32)> = entries.iter().map(|e| (e.question_id.as_str(), e.position)).collect();
    assert_eq!(order, vec![("Q1", 1), ("P", 2), ("P-1", 3), ("P-2", 4), ("Q2", 5)]);
    assert_eq!(entries[2].group_parent, Some(QuestionId::new("P")));
    assert_eq!(entries[1].group_parent, None);
    assert_eq!(entries[4].chapter_id.as_str(), "C2");
  }

  #[test]
  fn test_entry_chapter_is_question_chapter() {
    // A cross-chapter fill keeps its own chapter even in another row's slot
    let q = ranked("X1", "C9", 1);
    let mut it = item(q, vec![]);
    it.selected.slot = SlotKey::new(ChapterId::new("C1"), 1);
    let entries = assemble_entries(2, &[it]);
    assert_eq!(entries[0].chapter_id.as_str(), "C9");
    assert_eq!(entries[0].variant, 2);
  }

  #[test]
  fn test_empty_variant() {
    let variant = assemble_variant(1, &[], Diagnostics::new());
    assert_eq!(variant.index, 1);
    assert!(variant.entries.is_empty());
    assert!(variant.warnings.is_empty());
  }
}
