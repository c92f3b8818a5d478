use clap::{Args, Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use exam_assembler::config::{self, ConfigError};
use exam_assembler::db::SqliteBank;
use exam_assembler::domain::{ExamRequest, GenerationOutput};
use exam_assembler::groups::GroupPolicy;
use exam_assembler::selection::RandomSource;
use exam_assembler::validation::validate_distribution;
use exam_assembler::{profiling, EngineError, ExamEngine, RepositoryError};

#[derive(Debug, Parser)]
#[command(name = "exam-assembler", about = "Assemble exams from a question bank and a matrix")]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
  /// Generate exam variants for a matrix request (JSON on stdout)
  Generate(GenerateArgs),
  /// Print the integrity report of a generated output file
  Report(ReportArgs),
}

#[derive(Debug, Args)]
struct GenerateArgs {
  /// Request JSON: {"label", "variant_count", "matrix": [{"chapter", "clo1".."clo5"}]}
  #[arg(long)]
  matrix: PathBuf,
  /// Override the request's variant count
  #[arg(long)]
  variants: Option<u32>,
  /// Seed for a reproducible run
  #[arg(long)]
  seed: Option<u64>,
  /// Drop group questions whose children do not match the declared count
  #[arg(long)]
  strict_groups: bool,
  /// Never fill a chapter with questions from other chapters
  #[arg(long)]
  no_cross_chapter: bool,
  /// Question bank (defaults to config.toml, DATABASE_PATH, then DATA_DIR)
  #[arg(long)]
  db: Option<PathBuf>,
  /// Also print the integrity report to stderr
  #[arg(long)]
  report: bool,
}

#[derive(Debug, Args)]
struct ReportArgs {
  /// Output JSON written by `generate`
  #[arg(long)]
  output: PathBuf,
}

#[derive(Debug, Error)]
enum CliError {
  #[error("failed to read {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("invalid JSON: {0}")]
  Json(#[from] serde_json::Error),
  #[error(transparent)]
  Config(#[from] ConfigError),
  #[error(transparent)]
  Repository(#[from] RepositoryError),
  #[error(transparent)]
  Engine(#[from] EngineError),
}

impl CliError {
  fn user_message(&self) -> String {
    match self {
      CliError::Io { path, .. } => format!("Could not read {}", path.display()),
      CliError::Json(e) => format!("The file is not valid JSON ({})", e),
      CliError::Config(e) => e.user_message(),
      CliError::Repository(_) => "The question bank could not be opened".to_string(),
      CliError::Engine(e) => e.user_message().to_string(),
    }
  }
}

fn read_file(path: &Path) -> Result<String, CliError> {
  std::fs::read_to_string(path).map_err(|source| CliError::Io {
    path: path.to_path_buf(),
    source,
  })
}

fn generate(args: GenerateArgs) -> Result<ExitCode, CliError> {
  let mut request: ExamRequest = serde_json::from_str(&read_file(&args.matrix)?)?;
  if let Some(variants) = args.variants {
    request.variant_count = variants;
  }

  let mut engine_config = config::load_engine_config()?;
  if args.strict_groups {
    engine_config.group_policy = GroupPolicy::Strict;
  }
  if args.no_cross_chapter {
    engine_config.cross_chapter_fallback = false;
  }

  let db_path = args.db.unwrap_or_else(config::load_database_path);
  let bank = SqliteBank::open(&db_path)?;
  let engine = ExamEngine::new(&bank, &bank, engine_config);

  let mut rng: Box<dyn RandomSource> = match args.seed {
    Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
    None => Box::new(rand::rng()),
  };
  let output = engine.generate(&request, &mut *rng)?;

  println!("{}", serde_json::to_string_pretty(&output)?);
  if args.report {
    eprintln!("{}", validate_distribution(&output.variants).render());
  }
  Ok(ExitCode::SUCCESS)
}

fn report(args: ReportArgs) -> Result<ExitCode, CliError> {
  let output: GenerationOutput = serde_json::from_str(&read_file(&args.output)?)?;
  let report = validate_distribution(&output.variants);
  println!("{}", report.render());
  Ok(if report.is_valid() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn main() -> ExitCode {
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "exam_assembler=info".into()),
    )
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();

  // Initialize profiling (no-op if feature disabled)
  profiling::init();

  let cli = Cli::parse();
  let result = match cli.command {
    Commands::Generate(args) => generate(args),
    Commands::Report(args) => report(args),
  };

  profiling::shutdown();

  match result {
    Ok(code) => code,
    Err(e) => {
      tracing::error!("{}", e);
      eprintln!("Error: {}", e.user_message());
      ExitCode::FAILURE
    }
  }
}
