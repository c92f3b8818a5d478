//! One generation request, end to end.
//!
//! load pool -> stratified selection -> group expansion -> (variants > 1)
//! distribution -> allocation entries

use chrono::{DateTime, Utc};

use crate::assembler::{assemble_plans, assemble_variant};
use crate::config::EngineConfig;
use crate::domain::{matrix_total, normalize_matrix, Diagnostics, ExamRequest, GenerationOutput, MatrixRequirement};
use crate::error::EngineError;
use crate::groups::expand_groups;
use crate::recency::{RecencyTracker, RecencyWindow};
use crate::repository::{ExamHistoryRepository, QuestionRepository};
use crate::selection::{distribute, select_stratified, PoolLoader, RandomSource, SelectionPolicy};
use crate::validation::validate_distribution;

#[cfg(feature = "profiling")]
use crate::profiling::EventType;

pub struct ExamEngine<'a> {
  questions: &'a dyn QuestionRepository,
  history: &'a dyn ExamHistoryRepository,
  config: EngineConfig,
}

impl<'a> ExamEngine<'a> {
  pub fn new(
    questions: &'a dyn QuestionRepository,
    history: &'a dyn ExamHistoryRepository,
    config: EngineConfig,
  ) -> Self {
    Self {
      questions,
      history,
      config,
    }
  }

  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  pub fn generate(&self, request: &ExamRequest, rng: &mut dyn RandomSource) -> Result<GenerationOutput, EngineError> {
    self.generate_at(request, Utc::now(), rng)
  }

  /// Generate with an explicit reference time for the recency windows
  pub fn generate_at(
    &self,
    request: &ExamRequest,
    now: DateTime<Utc>,
    rng: &mut dyn RandomSource,
  ) -> Result<GenerationOutput, EngineError> {
    let (matrix, demand) = validate_request(request)?;
    let variant_count = request.variant_count;

    tracing::info!(
      "Generating '{}': {} chapters, {} variants, {} questions requested",
      request.label,
      matrix.len(),
      variant_count,
      demand
    );

    let mut diagnostics = Diagnostics::new();

    let tracker = RecencyTracker::new(
      self.history,
      self.questions,
      RecencyWindow::from_config(&self.config),
      now,
    );
    let loader = PoolLoader::new(
      self.questions,
      &tracker,
      self.config.chapter_question_cap,
      self.config.expansion_threshold,
    );
    let pool = loader.load(&matrix, demand, &mut diagnostics)?;

    let policy = SelectionPolicy {
      cross_chapter_fallback: self.config.cross_chapter_fallback,
    };
    let selection = select_stratified(pool, &matrix, variant_count, policy, rng, &mut diagnostics)?;
    if variant_count == 1 {
      selection.report_shortfalls(&mut diagnostics);
    }

    let items = expand_groups(selection.selected, self.questions, self.config.group_policy, &mut diagnostics)?;
    if items.is_empty() {
      return Err(EngineError::EmptyPool {
        chapters: matrix.iter().map(|row| row.chapter_id.clone()).collect(),
      });
    }

    let variants = if variant_count == 1 {
      vec![assemble_variant(0, &items, diagnostics)]
    } else {
      let mut plans = distribute(items, &matrix, variant_count as usize, rng);
      // Selection-stage diagnostics concern every variant
      for plan in &mut plans {
        let mut merged = diagnostics.clone();
        merged.extend(std::mem::take(&mut plan.diagnostics));
        plan.diagnostics = merged;
      }
      assemble_plans(plans)
    };

    let output = GenerationOutput {
      label: request.label.clone(),
      variants,
    };

    let report = validate_distribution(&output.variants);
    if report.is_valid() {
      tracing::info!("Generated '{}': {}", output.label, report.summary());
    } else {
      tracing::warn!("Generated '{}': {}", output.label, report.summary());
    }

    #[cfg(feature = "profiling")]
    crate::profile_log!(EventType::EngineRun {
      label: output.label.clone(),
      variants: variant_count,
      demand,
      entries: output.total_entries() as i64,
      warnings: output.variants.iter().map(|v| v.warnings.len() as i64).sum(),
    });

    Ok(output)
  }
}

/// Check the request and return the merged matrix with its total demand
fn validate_request(request: &ExamRequest) -> Result<(Vec<MatrixRequirement>, u32), EngineError> {
  if request.variant_count == 0 {
    return Err(EngineError::InvalidRequest("variant count must be at least 1".into()));
  }
  if request.matrix.is_empty() {
    return Err(EngineError::InvalidRequest("matrix has no rows".into()));
  }
  if let Some(index) = request.matrix.iter().position(|row| row.chapter_id.as_str().trim().is_empty()) {
    return Err(EngineError::InvalidRequest(format!("matrix row {} has no chapter", index + 1)));
  }

  let too_large = || EngineError::InvalidRequest("matrix counts are too large".into());
  let matrix = normalize_matrix(&request.matrix).ok_or_else(too_large)?;
  let total = matrix_total(&matrix).ok_or_else(too_large)?;
  if total == 0 {
    return Err(EngineError::InvalidRequest("matrix does not request any question".into()));
  }
  let demand = total.checked_mul(request.variant_count).ok_or_else(too_large)?;
  Ok((matrix, demand))
}
