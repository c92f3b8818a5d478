pub mod assembler;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod groups;
pub mod paths;
pub mod profiling;
pub mod recency;
pub mod repository;
pub mod selection;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

pub use config::EngineConfig;
pub use engine::ExamEngine;
pub use error::{EngineError, RepositoryError};
