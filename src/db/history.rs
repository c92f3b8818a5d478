//! Exam history: which questions past exams used

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, Result};
use std::collections::HashSet;

use super::{placeholders, SqliteBank, ID_CHUNK_SIZE};
use crate::domain::{ExamId, QuestionId};
use crate::repository::{ExamHistoryRepository, RepoResult};

pub fn insert_exam(conn: &Connection, id: &str, label: &str, created_at: DateTime<Utc>) -> Result<()> {
  conn.execute(
    "INSERT INTO exams (id, label, created_at) VALUES (?1, ?2, ?3)",
    params![id, label, created_at.to_rfc3339()],
  )?;
  Ok(())
}

pub fn insert_exam_question(
  conn: &Connection,
  exam_id: &str,
  question_id: &str,
  variant: usize,
  position: u32,
) -> Result<()> {
  conn.execute(
    "INSERT OR IGNORE INTO exam_questions (exam_id, question_id, variant, position) VALUES (?1, ?2, ?3, ?4)",
    params![exam_id, question_id, variant as i64, position],
  )?;
  Ok(())
}

impl ExamHistoryRepository for SqliteBank {
  fn exams_created_since(&self, since: DateTime<Utc>) -> RepoResult<Vec<ExamId>> {
    let conn = self.conn()?;
    // RFC 3339 UTC timestamps sort lexically
    let mut stmt = conn.prepare("SELECT id FROM exams WHERE created_at >= ?1 ORDER BY created_at, id")?;
    let exams = stmt
      .query_map(params![since.to_rfc3339()], |row| row.get::<_, String>(0))?
      .collect::<Result<Vec<_>>>()?;
    Ok(exams.into_iter().map(ExamId::new).collect())
  }

  fn questions_used_in(&self, exam_ids: &[ExamId]) -> RepoResult<HashSet<QuestionId>> {
    let conn = self.conn()?;
    let mut used = HashSet::new();
    for chunk in exam_ids.chunks(ID_CHUNK_SIZE) {
      let sql = format!(
        "SELECT DISTINCT question_id FROM exam_questions WHERE exam_id IN ({})",
        placeholders(chunk.len())
      );
      let mut stmt = conn.prepare(&sql)?;
      let rows = stmt.query_map(params_from_iter(chunk.iter().map(ExamId::as_str)), |row| {
        row.get::<_, String>(0)
      })?;
      for row in rows {
        used.insert(QuestionId::new(row?));
      }
    }
    Ok(used)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::TestEnv;
  use chrono::Duration;

  fn env_with_questions(ids: &[&str]) -> TestEnv {
    let env = TestEnv::new();
    for id in ids {
      env.add_ranked(id, "C1", 1);
    }
    env
  }

  #[test]
  fn test_exams_created_since() {
    let env = env_with_questions(&["Q1", "Q2"]);
    let now = Utc::now();
    env.add_exam("E-old", now - Duration::days(90), &["Q1"]);
    env.add_exam("E-new", now - Duration::days(2), &["Q2"]);

    let recent = env.bank.exams_created_since(now - Duration::days(30)).unwrap();
    assert_eq!(recent, vec![ExamId::new("E-new")]);
  }

  #[test]
  fn test_questions_used_in() {
    let env = env_with_questions(&["Q1", "Q2", "Q3", "Q4"]);
    let now = Utc::now();
    env.add_exam("E1", now, &["Q1", "Q2"]);
    env.add_exam("E2", now, &["Q2", "Q3"]);
    env.add_exam("E3", now, &["Q4"]);

    let used = env
      .bank
      .questions_used_in(&[ExamId::new("E1"), ExamId::new("E2")])
      .unwrap();
    let expected: HashSet<QuestionId> = ["Q1", "Q2", "Q3"].into_iter().map(QuestionId::new).collect();
    assert_eq!(used, expected);
  }

  #[test]
  fn test_no_exams_means_nothing_used() {
    let env = TestEnv::new();
    assert!(env.bank.questions_used_in(&[]).unwrap().is_empty());
    assert!(env.bank.exams_created_since(Utc::now()).unwrap().is_empty());
  }
}
