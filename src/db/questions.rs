//! Question bank queries and seeding helpers

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, Result};
use std::collections::HashSet;

use super::{placeholders, SqliteBank, ID_CHUNK_SIZE};
use crate::domain::{Answer, ChapterId, Question, QuestionId, DEFAULT_DIFFICULTY_LEVEL};
use crate::repository::{QuestionRepository, RepoResult};
#[cfg(feature = "profiling")]
use crate::profiling::EventType;

/// Columns read by [`row_to_question`], outcome rank and answer count resolved
const QUESTION_SELECT: &str = r#"
  SELECT q.id, q.chapter_id, q.outcome_id, COALESCE(o.rank, 0), q.difficulty_level,
         q.observed_difficulty, q.times_administered, q.times_correct, q.child_count,
         q.parent_id, q.sequence, q.content,
         (SELECT COUNT(*) FROM answers a WHERE a.question_id = q.id),
         q.deleted, q.created_at
  FROM questions q
  LEFT JOIN outcomes o ON o.id = q.outcome_id
"#;

pub fn insert_chapter(conn: &Connection, id: &str, name: &str, position: i64) -> Result<()> {
  conn.execute(
    "INSERT OR IGNORE INTO chapters (id, name, position) VALUES (?1, ?2, ?3)",
    params![id, name, position],
  )?;
  Ok(())
}

pub fn insert_outcome(conn: &Connection, id: &str, chapter_id: &str, rank: Option<u8>) -> Result<()> {
  conn.execute(
    "INSERT OR IGNORE INTO outcomes (id, chapter_id, rank) VALUES (?1, ?2, ?3)",
    params![id, chapter_id, rank],
  )?;
  Ok(())
}

/// Insert a question. `outcome_rank` and `answer_count` are derived on read and ignored here.
pub fn insert_question(conn: &Connection, question: &Question) -> Result<()> {
  conn.execute(
    r#"
    INSERT INTO questions (id, chapter_id, outcome_id, difficulty_level, observed_difficulty,
                           times_administered, times_correct, child_count, parent_id, sequence,
                           content, deleted, created_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
    "#,
    params![
      question.id.as_str(),
      question.chapter_id.as_str(),
      question.outcome_id,
      question.difficulty_level,
      question.observed_difficulty,
      question.times_administered,
      question.times_correct,
      question.child_count,
      question.parent_id.as_ref().map(QuestionId::as_str),
      question.sequence,
      question.content,
      question.deleted,
      question.created_at.to_rfc3339(),
    ],
  )?;
  Ok(())
}

pub fn insert_answer(conn: &Connection, answer: &Answer) -> Result<()> {
  conn.execute(
    "INSERT INTO answers (id, question_id, position, is_correct) VALUES (?1, ?2, ?3, ?4)",
    params![answer.id, answer.question_id.as_str(), answer.order, answer.is_correct],
  )?;
  Ok(())
}

pub(crate) fn row_to_question(row: &rusqlite::Row) -> Result<Question> {
  let rank: i64 = row.get(3)?;
  let difficulty_level: i64 = row.get(4)?;
  let parent_id: Option<String> = row.get(9)?;
  let answer_count: i64 = row.get(12)?;
  let created_at_str: String = row.get(14)?;

  Ok(Question {
    id: QuestionId::new(row.get::<_, String>(0)?),
    chapter_id: ChapterId::new(row.get::<_, String>(1)?),
    outcome_id: row.get(2)?,
    outcome_rank: u8::try_from(rank).unwrap_or(0),
    difficulty_level: u8::try_from(difficulty_level).unwrap_or(DEFAULT_DIFFICULTY_LEVEL),
    observed_difficulty: row.get(5)?,
    times_administered: row.get(6)?,
    times_correct: row.get(7)?,
    child_count: row.get(8)?,
    parent_id: parent_id.map(QuestionId::new),
    sequence: row.get(10)?,
    content: row.get(11)?,
    answer_count: u32::try_from(answer_count).unwrap_or(0),
    deleted: row.get(13)?,
    created_at: DateTime::parse_from_rfc3339(&created_at_str)
      .map(|dt| dt.with_timezone(&Utc))
      .unwrap_or_else(|_| Utc::now()),
  })
}

/// Questions whose `column` is one of `ids`, one `IN (...)` query per chunk
fn query_by_id_chunks(
  conn: &Connection,
  column: &str,
  ids: &[QuestionId],
  suffix: &str,
) -> Result<Vec<Question>> {
  let mut questions = Vec::new();
  for chunk in ids.chunks(ID_CHUNK_SIZE) {
    let sql = format!(
      "{} WHERE {} IN ({}) {}",
      QUESTION_SELECT,
      column,
      placeholders(chunk.len()),
      suffix
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params_from_iter(chunk.iter().map(QuestionId::as_str)), row_to_question)?;
    for row in rows {
      questions.push(row?);
    }
  }
  Ok(questions)
}

impl QuestionRepository for SqliteBank {
  fn find_by_chapter(
    &self,
    chapter_id: &ChapterId,
    exclude: &HashSet<QuestionId>,
    limit: usize,
  ) -> RepoResult<Vec<Question>> {
    let conn = self.conn()?;
    let mut stmt = conn.prepare(&format!(
      "{} WHERE q.chapter_id = ?1 AND q.deleted = 0 AND q.parent_id IS NULL ORDER BY q.created_at, q.id",
      QUESTION_SELECT
    ))?;

    // Exclusion sets can outgrow SQLite's variable limit, so filter while reading
    let mut questions = Vec::new();
    let mut rows = stmt.query(params![chapter_id.as_str()])?;
    while let Some(row) = rows.next()? {
      if questions.len() >= limit {
        break;
      }
      let question = row_to_question(row)?;
      if !exclude.contains(&question.id) {
        questions.push(question);
      }
    }

    #[cfg(feature = "profiling")]
    crate::profile_log!(EventType::Custom {
      name: "find_by_chapter".into(),
      data: serde_json::json!({ "chapter": chapter_id.as_str(), "rows": questions.len() }),
    });

    Ok(questions)
  }

  fn find_children(&self, parent_ids: &[QuestionId]) -> RepoResult<Vec<Question>> {
    if parent_ids.is_empty() {
      return Ok(Vec::new());
    }
    let conn = self.conn()?;
    Ok(query_by_id_chunks(
      &conn,
      "q.parent_id",
      parent_ids,
      "AND q.deleted = 0 ORDER BY q.parent_id, q.sequence, q.created_at",
    )?)
  }

  fn find_by_ids(&self, ids: &[QuestionId]) -> RepoResult<Vec<Question>> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    let conn = self.conn()?;
    Ok(query_by_id_chunks(&conn, "q.id", ids, "")?)
  }
}
