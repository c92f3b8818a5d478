//! Group questions: a parent followed by its ordered children.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::domain::{Diagnostics, Question, QuestionId, Warning};
use crate::repository::{QuestionRepository, RepoResult};
use crate::selection::SelectedQuestion;

/// What to do with a group whose children do not match its declared count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupPolicy {
  /// Keep the parent with whatever children exist
  #[default]
  Lenient,
  /// Drop the whole group
  Strict,
}

/// A selected top-level question plus its children, in exam order
#[derive(Debug, Clone)]
pub struct ExpandedItem {
  pub selected: SelectedQuestion,
  pub children: Vec<Question>,
}

impl ExpandedItem {
  pub fn id(&self) -> &QuestionId {
    &self.selected.question.id
  }

  /// Number of allocation entries this item turns into
  pub fn entry_count(&self) -> usize {
    1 + self.children.len()
  }
}

fn child_order(a: &Question, b: &Question) -> std::cmp::Ordering {
  // Sequenced children first, then creation time, then ID
  let key = |q: &Question| (q.sequence.is_none(), q.sequence, q.created_at);
  key(a).cmp(&key(b)).then_with(|| a.id.cmp(&b.id))
}

/// Attach children to every selected group parent.
///
/// Children are fetched in one repository call. Parents whose child count
/// differs from what they declare raise a warning and, under
/// [`GroupPolicy::Strict`], are dropped.
pub fn expand_groups(
  selected: Vec<SelectedQuestion>,
  repo: &dyn QuestionRepository,
  policy: GroupPolicy,
  diagnostics: &mut Diagnostics,
) -> RepoResult<Vec<ExpandedItem>> {
  let parent_ids: Vec<QuestionId> = selected
    .iter()
    .filter(|s| s.question.is_group_parent())
    .map(|s| s.question.id.clone())
    .collect();

  let mut children_by_parent: HashMap<QuestionId, Vec<Question>> = HashMap::new();
  if !parent_ids.is_empty() {
    let wanted: HashSet<&QuestionId> = parent_ids.iter().collect();
    let mut seen = HashSet::new();
    for child in repo.find_children(&parent_ids)? {
      if child.deleted || !seen.insert(child.id.clone()) {
        continue;
      }
      if let Some(parent) = child.parent_id.clone().filter(|p| wanted.contains(p)) {
        children_by_parent.entry(parent).or_default().push(child);
      }
    }
    tracing::debug!(
      "Fetched children for {} group questions",
      parent_ids.len()
    );
  }

  let mut expanded = Vec::with_capacity(selected.len());
  for item in selected {
    if !item.question.is_group_parent() {
      expanded.push(ExpandedItem {
        selected: item,
        children: Vec::new(),
      });
      continue;
    }

    let mut children = children_by_parent.remove(&item.question.id).unwrap_or_default();
    children.sort_by(child_order);

    let declared = item.question.child_count;
    let actual = children.len() as u32;
    if actual != declared {
      let rejected = policy == GroupPolicy::Strict;
      diagnostics.record(Warning::GroupIntegrityMismatch {
        parent: item.question.id.clone(),
        chapter: item.question.chapter_id.clone(),
        declared,
        actual,
        rejected,
      });
      if rejected {
        continue;
      }
    }

    expanded.push(ExpandedItem {
      selected: item,
      children,
    });
  }

  Ok(expanded)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::repository::InMemoryBank;
  use crate::selection::{SlotKey, Tier};
  use crate::testing::{child_of, group_parent, ranked};
  use chrono::{Duration, Utc};
  use std::sync::Arc;

  fn select(question: &Question) -> SelectedQuestion {
    SelectedQuestion {
      question: Arc::new(question.clone()),
      slot: SlotKey::new(question.chapter_id.clone(), question.outcome_rank),
      tier: Tier::ExactOutcome,
    }
  }

  fn ids(children: &[Question]) -> Vec<&str> {
    children.iter().map(|c| c.id.as_str()).collect()
  }

  #[test]
  fn test_children_follow_sequence_then_creation() {
    let now = Utc::now();
    let parent = group_parent("P", "C1", 1, 3);
    let mut c1 = child_of("C-a", &parent, Some(2));
    let mut c2 = child_of("C-b", &parent, None);
    let c3 = child_of("C-c", &parent, Some(1));
    c1.created_at = now;
    c2.created_at = now - Duration::hours(1);
    let bank = InMemoryBank::with_questions(vec![parent.clone(), c1, c2, c3]);

    let mut diagnostics = Diagnostics::new();
    let expanded = expand_groups(vec![select(&parent)], &bank, GroupPolicy::Lenient, &mut diagnostics).unwrap();

    assert_eq!(expanded.len(), 1);
    assert_eq!(ids(&expanded[0].children), vec!["C-c", "C-a", "C-b"]);
    assert_eq!(expanded[0].entry_count(), 4);
    assert!(diagnostics.is_empty());
  }

  #[test]
  fn test_unsequenced_children_order_by_creation() {
    let now = Utc::now();
    let parent = group_parent("P", "C1", 1, 2);
    let mut late = child_of("A", &parent, None);
    let mut early = child_of("B", &parent, None);
    late.created_at = now;
    early.created_at = now - Duration::minutes(5);
    let bank = InMemoryBank::with_questions(vec![parent.clone(), late, early]);

    let expanded = expand_groups(vec![select(&parent)], &bank, GroupPolicy::Lenient, &mut Diagnostics::new()).unwrap();
    assert_eq!(ids(&expanded[0].children), vec!["B", "A"]);
  }

  #[test]
  fn test_lenient_keeps_mismatched_group() {
    let parent = group_parent("P", "C1", 1, 3);
    let child = child_of("C1-1", &parent, Some(1));
    let bank = InMemoryBank::with_questions(vec![parent.clone(), child]);

    let mut diagnostics = Diagnostics::new();
    let expanded = expand_groups(vec![select(&parent)], &bank, GroupPolicy::Lenient, &mut diagnostics).unwrap();

    assert_eq!(expanded.len(), 1);
    assert_eq!(expanded[0].children.len(), 1);
    assert_eq!(
      diagnostics.warnings(),
      &[Warning::GroupIntegrityMismatch {
        parent: QuestionId::new("P"),
        chapter: parent.chapter_id.clone(),
        declared: 3,
        actual: 1,
        rejected: false,
      }]
    );
  }

  #[test]
  fn test_strict_drops_mismatched_group() {
    let parent = group_parent("P", "C1", 1, 2);
    let plain = ranked("Q1", "C1", 1);
    let bank = InMemoryBank::with_questions(vec![parent.clone(), plain.clone()]);

    let mut diagnostics = Diagnostics::new();
    let expanded = expand_groups(
      vec![select(&parent), select(&plain)],
      &bank,
      GroupPolicy::Strict,
      &mut diagnostics,
    )
    .unwrap();

    assert_eq!(expanded.len(), 1);
    assert_eq!(expanded[0].id().as_str(), "Q1");
    assert!(matches!(
      diagnostics.warnings()[0],
      Warning::GroupIntegrityMismatch { rejected: true, actual: 0, .. }
    ));
  }

  #[test]
  fn test_deleted_children_are_ignored() {
    let parent = group_parent("P", "C1", 1, 1);
    let kept = child_of("K", &parent, Some(1));
    let mut gone = child_of("G", &parent, Some(2));
    gone.deleted = true;
    let bank = InMemoryBank::with_questions(vec![parent.clone(), kept, gone]);

    let mut diagnostics = Diagnostics::new();
    let expanded = expand_groups(vec![select(&parent)], &bank, GroupPolicy::Strict, &mut diagnostics).unwrap();
    assert_eq!(ids(&expanded[0].children), vec!["K"]);
    assert!(diagnostics.is_empty());
  }

  #[test]
  fn test_plain_questions_pass_through() {
    let q = ranked("Q1", "C1", 2);
    let bank = InMemoryBank::with_questions(vec![q.clone()]);
    let expanded = expand_groups(vec![select(&q)], &bank, GroupPolicy::Strict, &mut Diagnostics::new()).unwrap();
    assert_eq!(expanded.len(), 1);
    assert!(expanded[0].children.is_empty());
  }
}
