//! Fitted boosted-tree churn classifier

use serde::{Deserialize, Serialize};

use super::tree::Tree;
use crate::classifier::{ensure_width, Classifier};
use crate::errors::{ChurnError, Result};
use crate::matrix::FeatureMatrix;

/// Model format version
pub const MODEL_VERSION: u32 = 1;

/// Model family name recorded in artifact metadata
pub const MODEL_TYPE: &str = "GradientBoostedTreesClassifier";

/// Logistic-loss tree ensemble
///
/// The positive-class probability of a row is
/// `sigmoid(bias + Σ tree.weight * tree.evaluate(row))`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GbdtClassifier {
    pub version: u32,

    /// Width of the training matrix
    pub n_features: usize,

    /// Fingerprint of the ordered training columns
    pub feature_fingerprint: String,

    /// Initial log-odds (training prior)
    pub bias: f64,

    pub trees: Vec<Tree>,
}

impl GbdtClassifier {
    pub fn validate(&self) -> Result<()> {
        if self.version != MODEL_VERSION {
            return Err(ChurnError::Config(format!(
                "Unsupported model version: {}",
                self.version
            )));
        }
        if self.n_features == 0 {
            return Err(ChurnError::Config("Model has no features".to_string()));
        }
        if !self.bias.is_finite() {
            return Err(ChurnError::Config(format!("Invalid bias: {}", self.bias)));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.n_features).map_err(|e| {
                ChurnError::Config(format!("Tree {i} validation failed: {e}"))
            })?;
        }
        Ok(())
    }

    /// Log-odds for one row
    pub fn raw_score(&self, row: &[f64]) -> f64 {
        self.trees
            .iter()
            .fold(self.bias, |acc, tree| acc + tree.weight * tree.evaluate(row))
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }
}

impl Classifier for GbdtClassifier {
    fn model_type(&self) -> &'static str {
        MODEL_TYPE
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn feature_fingerprint(&self) -> &str {
        &self.feature_fingerprint
    }

    fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
        ensure_width(self.n_features, features)?;
        Ok(features
            .rows()
            .iter()
            .map(|row| sigmoid(self.raw_score(row)))
            .collect())
    }
}

pub(crate) fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gbdt::tree::Node;

    fn create_test_model() -> GbdtClassifier {
        let tree = Tree::new(
            vec![
                Node::internal(0, 0, 0.5, 1, 2),
                Node::leaf(1, -2.0),
                Node::leaf(2, 2.0),
            ],
            1.0,
        );
        GbdtClassifier {
            version: MODEL_VERSION,
            n_features: 2,
            feature_fingerprint: "test".to_string(),
            bias: 0.0,
            trees: vec![tree],
        }
    }

    fn matrix(rows: Vec<Vec<f64>>) -> FeatureMatrix {
        let width = rows.first().map_or(0, Vec::len);
        FeatureMatrix::new((0..width).map(|i| format!("f{i}")).collect(), rows).unwrap()
    }

    #[test]
    fn test_predictions_follow_tree() {
        let model = create_test_model();
        let x = matrix(vec![vec![0.0, 9.0], vec![1.0, 9.0]]);

        let proba = model.predict_proba(&x).unwrap();
        assert!((proba[0] - sigmoid(-2.0)).abs() < 1e-12);
        assert!((proba[1] - sigmoid(2.0)).abs() < 1e-12);
        assert_eq!(model.predict(&x).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_width_mismatch_is_schema_error() {
        let model = create_test_model();
        let x = matrix(vec![vec![0.0, 1.0, 2.0]]);

        match model.predict_proba(&x) {
            Err(ChurnError::SchemaMismatch { expected, actual }) => {
                assert_eq!(expected, 2);
                assert_eq!(actual, 3);
            }
            other => panic!("expected schema mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_model_validation() {
        assert!(create_test_model().validate().is_ok());

        let mut invalid = create_test_model();
        invalid.version = 999;
        assert!(invalid.validate().is_err());

        let mut invalid = create_test_model();
        invalid.n_features = 0;
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_sigmoid_bounds() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(800.0) <= 1.0);
        assert!(sigmoid(-800.0) >= 0.0);
    }
}
