use rusqlite::{Connection, Result};

pub fn run_migrations(conn: &Connection) -> Result<()> {
  // Create tables with COMPLETE schema for new databases
  // Migrations below handle upgrades for existing databases
  conn.execute_batch(
    r#"
    CREATE TABLE IF NOT EXISTS chapters (
      id TEXT PRIMARY KEY,
      name TEXT NOT NULL,
      position INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS outcomes (
      id TEXT PRIMARY KEY,
      chapter_id TEXT,
      -- 1-5, NULL when the outcome was never ranked
      rank INTEGER,
      description TEXT,
      FOREIGN KEY (chapter_id) REFERENCES chapters(id)
    );

    CREATE TABLE IF NOT EXISTS questions (
      id TEXT PRIMARY KEY,
      chapter_id TEXT NOT NULL,
      outcome_id TEXT,
      difficulty_level INTEGER NOT NULL DEFAULT 3,
      observed_difficulty REAL,
      times_administered INTEGER NOT NULL DEFAULT 0,
      times_correct INTEGER NOT NULL DEFAULT 0,
      -- Group questions
      child_count INTEGER NOT NULL DEFAULT 0,
      parent_id TEXT,
      sequence INTEGER,
      content TEXT NOT NULL DEFAULT '',
      deleted INTEGER NOT NULL DEFAULT 0,
      created_at TEXT NOT NULL,
      FOREIGN KEY (chapter_id) REFERENCES chapters(id),
      FOREIGN KEY (outcome_id) REFERENCES outcomes(id),
      FOREIGN KEY (parent_id) REFERENCES questions(id)
    );

    CREATE TABLE IF NOT EXISTS answers (
      id TEXT PRIMARY KEY,
      question_id TEXT NOT NULL,
      position INTEGER NOT NULL DEFAULT 0,
      is_correct INTEGER NOT NULL DEFAULT 0,
      FOREIGN KEY (question_id) REFERENCES questions(id)
    );

    CREATE TABLE IF NOT EXISTS exams (
      id TEXT PRIMARY KEY,
      label TEXT NOT NULL DEFAULT '',
      created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS exam_questions (
      exam_id TEXT NOT NULL,
      question_id TEXT NOT NULL,
      variant INTEGER NOT NULL DEFAULT 0,
      position INTEGER NOT NULL DEFAULT 0,
      PRIMARY KEY (exam_id, variant, question_id),
      FOREIGN KEY (exam_id) REFERENCES exams(id),
      FOREIGN KEY (question_id) REFERENCES questions(id)
    );

    -- Indexes
    CREATE INDEX IF NOT EXISTS idx_questions_chapter ON questions(chapter_id, deleted);
    CREATE INDEX IF NOT EXISTS idx_questions_parent ON questions(parent_id);
    CREATE INDEX IF NOT EXISTS idx_answers_question ON answers(question_id);
    CREATE INDEX IF NOT EXISTS idx_exams_created_at ON exams(created_at);
    CREATE INDEX IF NOT EXISTS idx_exam_questions_question ON exam_questions(question_id);
    "#,
  )?;

  // ============================================================
  // MIGRATIONS FOR EXISTING DATABASES
  // These are no-ops for new databases (columns already exist)
  // ============================================================

  // Migration: calibration data arrived after the first banks were built
  add_column_if_missing(conn, "questions", "observed_difficulty", "REAL")?;
  add_column_if_missing(conn, "questions", "times_administered", "INTEGER NOT NULL DEFAULT 0")?;
  add_column_if_missing(conn, "questions", "times_correct", "INTEGER NOT NULL DEFAULT 0")?;

  // Migration: child ordering inside groups
  add_column_if_missing(conn, "questions", "sequence", "INTEGER")?;

  Ok(())
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> bool {
  conn
    .prepare(&format!("SELECT {} FROM {} LIMIT 1", column, table))
    .is_ok()
}

/// Add a column if it doesn't already exist
fn add_column_if_missing(conn: &Connection, table: &str, column: &str, column_def: &str) -> Result<()> {
  if !column_exists(conn, table, column) {
    conn.execute(
      &format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, column_def),
      [],
    )?;
  }
  Ok(())
}
