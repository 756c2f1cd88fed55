//! Churn Trainer - training, artifact persistence and batch scoring
//!
//! Builds on `churn-core` to run the full pipeline: generate labeled data,
//! fit and evaluate a boosted-tree classifier, persist it together with its
//! feature schema, and score new customer batches against that artifact.

pub mod artifacts;
pub mod config;
pub mod errors;
pub mod logging;
pub mod pipeline;
pub mod scoring;
pub mod trainer;

pub use artifacts::{ArtifactPaths, ModelArtifact, ModelMetadata};
pub use config::PipelineConfig;
pub use errors::{Result, TrainerError};
pub use pipeline::{generate_inference_data, run_training, sample_customers, score_file, TrainingReport};
pub use scoring::{ScoredBatch, ScoringEngine, PROBABILITY_COLUMN};
pub use trainer::{train_and_evaluate, TrainTestSplit, TrainingOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
