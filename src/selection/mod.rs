//! Question selection: weighting, sampling, pool loading, stratified
//! selection and multi-variant distribution.

pub mod distributor;
pub mod loader;
pub mod pool;
pub mod sampler;
pub mod stratified;
pub mod weight;

pub use distributor::{distribute, VariantPlan};
pub use loader::PoolLoader;
pub use pool::{ChapterPool, Pool};
pub use sampler::{shuffle, weighted_sample, RandomSource};
pub use stratified::{select_stratified, SelectedQuestion, Selection, SelectionPolicy, Shortfall, SlotKey, Tier};
pub use weight::{question_weight, weigh_all, QuestionWeight, MAX_WEIGHT, MIN_WEIGHT};
