//! Gradient-boosted tree learner (logistic loss)

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::binning::FeatureBinner;
use super::cart::{CartBuilder, TreeConfig};
use super::model::{sigmoid, GbdtClassifier, MODEL_VERSION};
use crate::classifier::Learner;
use crate::errors::{ChurnError, Result};
use crate::matrix::FeatureMatrix;
use crate::schema::FeatureSchema;

/// Smallest hessian used in split search and leaf values
const MIN_HESSIAN: f64 = 1e-6;

/// Deepest tree the learner will grow
pub const MAX_TREE_DEPTH: usize = 32;

/// GBDT training configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GbdtConfig {
    pub num_trees: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub learning_rate: f64,
    pub max_bins: usize,
    pub l2_regularization: f64,
}

impl Default for GbdtConfig {
    fn default() -> Self {
        Self {
            num_trees: 100,
            max_depth: 4,
            min_samples_leaf: 20,
            learning_rate: 0.1,
            max_bins: 32,
            l2_regularization: 1.0,
        }
    }
}

impl GbdtConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(ChurnError::Config(format!(
                "learning_rate must be in (0, 1], got {}",
                self.learning_rate
            )));
        }
        if !(self.l2_regularization >= 0.0 && self.l2_regularization.is_finite()) {
            return Err(ChurnError::Config(format!(
                "l2_regularization must be a finite value >= 0, got {}",
                self.l2_regularization
            )));
        }
        if self.max_bins < 2 || self.max_bins > u16::MAX as usize {
            return Err(ChurnError::Config(format!(
                "max_bins must be in [2, {}], got {}",
                u16::MAX,
                self.max_bins
            )));
        }
        if self.max_depth > MAX_TREE_DEPTH {
            return Err(ChurnError::Config(format!(
                "max_depth must be at most {MAX_TREE_DEPTH}, got {}",
                self.max_depth
            )));
        }
        if self.min_samples_leaf == 0 {
            return Err(ChurnError::Config(
                "min_samples_leaf must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Boosted-tree learner
#[derive(Clone, Debug, Default)]
pub struct GbdtTrainer {
    config: GbdtConfig,
}

impl GbdtTrainer {
    pub fn new(config: GbdtConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GbdtConfig {
        &self.config
    }
}

impl Learner for GbdtTrainer {
    type Model = GbdtClassifier;

    fn fit(&self, features: &FeatureMatrix, labels: &[u8]) -> Result<GbdtClassifier> {
        self.config.validate()?;

        let n_samples = features.n_rows();
        if n_samples == 0 || features.n_cols() == 0 {
            return Err(ChurnError::InvalidParameters(format!(
                "cannot fit on a {}x{} matrix",
                n_samples,
                features.n_cols()
            )));
        }
        if labels.len() != n_samples {
            return Err(ChurnError::InvalidParameters(format!(
                "{} labels for {} rows",
                labels.len(),
                n_samples
            )));
        }
        if let Some(bad) = labels.iter().find(|&&l| l > 1) {
            return Err(ChurnError::InvalidParameters(format!(
                "labels must be 0 or 1, got {bad}"
            )));
        }

        let feature_fingerprint = FeatureSchema::new(features.columns().to_vec())?.fingerprint()?;
        let targets: Vec<f64> = labels.iter().map(|&l| f64::from(l)).collect();

        let prior = (targets.iter().sum::<f64>() / n_samples as f64).clamp(1e-6, 1.0 - 1e-6);
        let bias = (prior / (1.0 - prior)).ln();
        let mut raw = vec![bias; n_samples];

        let binner = FeatureBinner::fit(features, self.config.max_bins);
        let bins = binner.transform(features);
        let tree_config = TreeConfig {
            max_depth: self.config.max_depth,
            min_samples_leaf: self.config.min_samples_leaf,
            l2_regularization: self.config.l2_regularization,
        };

        let mut trees = Vec::with_capacity(self.config.num_trees);
        let mut gradients = vec![0.0; n_samples];
        let mut hessians = vec![0.0; n_samples];

        for tree_idx in 0..self.config.num_trees {
            for i in 0..n_samples {
                let p = sigmoid(raw[i]);
                gradients[i] = p - targets[i];
                hessians[i] = (p * (1.0 - p)).max(MIN_HESSIAN);
            }

            let tree = CartBuilder::new(&binner, &bins, &gradients, &hessians, tree_config.clone())
                .build(self.config.learning_rate);

            for (score, row) in raw.iter_mut().zip(features.rows()) {
                *score += tree.weight * tree.evaluate(row);
            }

            debug!(
                "Tree {}/{}: {} nodes",
                tree_idx + 1,
                self.config.num_trees,
                tree.nodes.len()
            );
            trees.push(tree);
        }

        Ok(GbdtClassifier {
            version: MODEL_VERSION,
            n_features: features.n_cols(),
            feature_fingerprint,
            bias,
            trees,
        })
    }
}
