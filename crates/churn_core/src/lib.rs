//! Churn Core - deterministic feature pipeline for churn prediction
//!
//! Synthesizes labeled customer data, encodes categorical fields into a
//! fixed-width numeric matrix and guarantees that scoring batches are
//! projected onto exactly the feature layout a classifier was fitted on.
//!
//! Modules:
//! - `random`: seeded, platform-independent draw sequences
//! - `dataset`: customer records and delimited-text I/O
//! - `generator`: synthetic records and the parameterized churn model
//! - `encoder`: one-hot encoding of categorical columns
//! - `matrix`: named numeric feature matrix
//! - `schema`: persisted feature schema and alignment
//! - `classifier`: fit/predict capability traits
//! - `gbdt`: gradient-boosted tree classifier
//! - `metrics`: accuracy, precision, recall and F1
//! - `serialization`: canonical JSON and hashing helpers

pub mod classifier;
pub mod dataset;
pub mod encoder;
pub mod errors;
pub mod gbdt;
pub mod generator;
pub mod matrix;
pub mod metrics;
pub mod random;
pub mod schema;
pub mod serialization;

pub use classifier::{Classifier, Learner};
pub use dataset::{Dataset, Record, CATEGORICAL_COLUMNS};
pub use encoder::{one_hot_encode, Column, FeatureTable};
pub use errors::{ChurnError, Result};
pub use gbdt::{GbdtClassifier, GbdtConfig, GbdtTrainer};
pub use generator::{generate, ChurnRates, GeneratorConfig};
pub use matrix::FeatureMatrix;
pub use metrics::{evaluate, EvaluationMetrics};
pub use random::DeterministicRng;
pub use schema::FeatureSchema;

/// Crate version string for metadata and validation reports
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Encode a dataset's feature columns with the standard categorical list
pub fn encode_dataset(dataset: &Dataset) -> Result<FeatureMatrix> {
    one_hot_encode(&dataset.feature_table(), &CATEGORICAL_COLUMNS)
}
