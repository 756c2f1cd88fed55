//! Classifier capability
//!
//! The rest of the crate only depends on these traits, so any model family
//! that can fit a numeric matrix and emit per-row probabilities can replace
//! the boosted trees without touching encoding or schema alignment.

use crate::errors::{ChurnError, Result};
use crate::matrix::FeatureMatrix;

/// Probability at or below which a row is labeled as not churning
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Fitted binary classifier
pub trait Classifier {
    /// Human-readable model family name, recorded in metadata
    fn model_type(&self) -> &'static str;

    /// Width of the feature matrix the model was fitted on
    fn n_features(&self) -> usize;

    /// Fingerprint of the ordered feature columns seen during fitting
    fn feature_fingerprint(&self) -> &str;

    /// Positive-class probability per row, in row order
    fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<f64>>;

    /// Class label per row (1 = churn)
    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<u8>> {
        Ok(self
            .predict_proba(features)?
            .into_iter()
            .map(|p| u8::from(p > DECISION_THRESHOLD))
            .collect())
    }
}

/// Training procedure producing a [`Classifier`]
pub trait Learner {
    type Model: Classifier;

    fn fit(&self, features: &FeatureMatrix, labels: &[u8]) -> Result<Self::Model>;
}

/// Fail with `SchemaMismatch` unless `features` is exactly `expected` columns wide
pub fn ensure_width(expected: usize, features: &FeatureMatrix) -> Result<()> {
    if features.n_cols() != expected {
        return Err(ChurnError::SchemaMismatch {
            expected,
            actual: features.n_cols(),
        });
    }
    Ok(())
}
