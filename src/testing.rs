//! Test utilities: a migrated SQLite bank in a temp dir, question fixtures
//! and a scripted random source.

use chrono::{DateTime, Utc};
use std::path::Path;
use tempfile::TempDir;

use crate::db::{self, SqliteBank};
use crate::domain::{Answer, Question, QuestionId};
use crate::selection::RandomSource;

/// Test environment with a question bank using the authoritative schema.
///
/// The database file lives in a temporary directory that is removed on drop.
pub struct TestEnv {
    /// Temporary directory (kept alive for database file persistence)
    pub temp: TempDir,
    pub bank: SqliteBank,
}

impl TestEnv {
    /// Create a bank through `db::init_db`, so every migration runs.
    pub fn new() -> Self {
        let temp = TempDir::new().expect("create temp dir");
        let bank = SqliteBank::open(&temp.path().join("questions.db")).expect("open test bank");
        Self { temp, bank }
    }

    /// Get the temporary directory path for creating test files.
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Insert a question together with its chapter and outcome rows
    pub fn add_question(&self, question: Question) {
        let conn = self.bank.conn().expect("lock test bank");
        let chapter = question.chapter_id.as_str();
        db::insert_chapter(&conn, chapter, chapter, 0).expect("insert chapter");
        if let Some(outcome_id) = &question.outcome_id {
            db::insert_outcome(&conn, outcome_id, chapter, question.known_rank()).expect("insert outcome");
        }
        db::insert_question(&conn, &question).expect("insert question");
    }

    /// Insert a question tagged with a ranked outcome of its chapter
    pub fn add_ranked(&self, id: &str, chapter: &str, rank: u8) {
        self.add_question(ranked(id, chapter, rank));
    }

    /// Give a question `count` answers, the first one correct
    pub fn add_answers(&self, question_id: &str, count: usize) {
        let conn = self.bank.conn().expect("lock test bank");
        let qid = QuestionId::new(question_id);
        for i in 0..count {
            let answer = Answer::new(format!("{}-a{}", question_id, i), &qid, i as i64, i == 0);
            db::insert_answer(&conn, &answer).expect("insert answer");
        }
    }

    /// Record a past exam that used `questions` in its first variant.
    ///
    /// The questions must already be in the bank.
    pub fn add_exam(&self, id: &str, created_at: DateTime<Utc>, questions: &[&str]) {
        let conn = self.bank.conn().expect("lock test bank");
        db::insert_exam(&conn, id, "", created_at).expect("insert exam");
        for (i, question_id) in questions.iter().enumerate() {
            db::insert_exam_question(&conn, id, question_id, 0, i as u32 + 1).expect("insert exam question");
        }
    }
}

// ==================== Fixtures ====================

/// A well-formed question of `chapter` with outcome `rank` (0 = no outcome)
pub fn ranked(id: &str, chapter: &str, rank: u8) -> Question {
    let mut question = Question::new(id, chapter);
    question.outcome_rank = rank;
    if rank > 0 {
        question.outcome_id = Some(format!("{}-CLO{}", chapter, rank));
    }
    question.answer_count = 4;
    question.content = format!("Question {} of chapter {}", id, chapter);
    question
}

/// A group parent declaring `child_count` children
pub fn group_parent(id: &str, chapter: &str, rank: u8, child_count: u32) -> Question {
    let mut question = ranked(id, chapter, rank);
    question.child_count = child_count;
    question
}

/// A child of `parent` in the same chapter
pub fn child_of(id: &str, parent: &Question, sequence: Option<i64>) -> Question {
    let mut question = Question::new(id, parent.chapter_id.as_str());
    question.parent_id = Some(parent.id.clone());
    question.sequence = sequence;
    question.answer_count = 4;
    question.content = format!("Part {} of {}", id, parent.id);
    question
}

/// Random source that always returns the same unit value
pub struct FixedSource {
    value: f64,
}

impl FixedSource {
    pub fn new(value: f64) -> Self {
        Self {
            value: value.clamp(0.0, 0.999_999_999),
        }
    }
}

impl RandomSource for FixedSource {
    fn next_unit(&mut self) -> f64 {
        self.value
    }

    fn next_index(&mut self, upper: usize) -> usize {
        ((self.value * upper as f64) as usize).min(upper.saturating_sub(1))
    }
}
