//! Training and evaluation engine
//!
//! Splits an encoded matrix into train and held-out partitions with a seeded
//! permutation, fits a learner on the training rows and scores the held-out
//! rows. Nothing is persisted here.

use churn_core::{
    evaluate, ChurnError, Classifier, DeterministicRng, EvaluationMetrics, FeatureMatrix, Learner,
};
use tracing::{debug, info};

use crate::errors::Result;

/// Default held-out fraction
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// Row indices of a train/test split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

impl TrainTestSplit {
    /// Plain random split. The held-out size is `ceil(n * test_fraction)`;
    /// both partitions must end up non-empty.
    pub fn new(n_rows: usize, test_fraction: f64, seed: u64) -> Result<Self> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(ChurnError::InvalidParameters(format!(
                "test_fraction must be in (0, 1), got {test_fraction}"
            ))
            .into());
        }
        let n_test = (n_rows as f64 * test_fraction).ceil() as usize;
        if n_test == 0 || n_test >= n_rows {
            return Err(ChurnError::InvalidParameters(format!(
                "cannot split {n_rows} rows with test_fraction {test_fraction}"
            ))
            .into());
        }

        let mut permutation = DeterministicRng::new(seed).shuffle_indices(n_rows);
        let train = permutation.split_off(n_test);
        Ok(Self {
            train,
            test: permutation,
        })
    }
}

/// Fitted model plus its held-out metrics
#[derive(Debug, Clone)]
pub struct TrainingOutcome<M> {
    pub model: M,
    pub metrics: EvaluationMetrics,
    pub train_size: usize,
    pub test_size: usize,
}

/// Split, fit on the training rows and evaluate on the held-out rows
pub fn train_and_evaluate<L: Learner>(
    learner: &L,
    features: &FeatureMatrix,
    labels: &[u8],
    seed: u64,
    test_fraction: f64,
) -> Result<TrainingOutcome<L::Model>> {
    if labels.len() != features.n_rows() {
        return Err(ChurnError::InvalidParameters(format!(
            "{} labels for {} rows",
            labels.len(),
            features.n_rows()
        ))
        .into());
    }

    let split = TrainTestSplit::new(features.n_rows(), test_fraction, seed)?;
    debug!(
        "Split {} rows into {} train / {} test (seed={})",
        features.n_rows(),
        split.train.len(),
        split.test.len(),
        seed
    );

    let x_train = features.select_rows(&split.train);
    let y_train: Vec<u8> = split.train.iter().map(|&i| labels[i]).collect();
    let x_test = features.select_rows(&split.test);
    let y_test: Vec<u8> = split.test.iter().map(|&i| labels[i]).collect();

    let model = learner.fit(&x_train, &y_train)?;
    let predictions = model.predict(&x_test)?;
    let metrics = evaluate(&y_test, &predictions)?;

    info!(
        "Held-out evaluation: accuracy={:.4} precision={:.4} recall={:.4} f1={:.4}",
        metrics.accuracy, metrics.precision, metrics.recall, metrics.f1_score
    );

    Ok(TrainingOutcome {
        model,
        metrics,
        train_size: split.train.len(),
        test_size: split.test.len(),
    })
}
