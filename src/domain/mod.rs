pub mod allocation;
pub mod diagnostics;
pub mod matrix;
pub mod question;

pub use allocation::{AllocationEntry, ExamVariant, GenerationOutput};
pub use diagnostics::{Diagnostics, Severity, Warning};
pub use matrix::{matrix_total, normalize_matrix, ExamRequest, MatrixRequirement};
pub use question::{
  Answer, ChapterId, ExamId, Question, QuestionId, DEFAULT_DIFFICULTY_LEVEL, MAX_OUTCOME_RANK,
};
