//! Binary classification metrics
//!
//! Any ratio with a zero denominator is reported as 0.0. Degenerate held-out
//! partitions (no positives, no predicted positives) are therefore never an
//! error and never produce NaN.

use serde::{Deserialize, Serialize};

use crate::errors::{ChurnError, Result};

/// Counts of a binary confusion matrix (1 = churn)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
}

impl ConfusionMatrix {
    pub fn from_labels(actual: &[u8], predicted: &[u8]) -> Result<Self> {
        if actual.len() != predicted.len() {
            return Err(ChurnError::InvalidParameters(format!(
                "{} actual labels vs {} predictions",
                actual.len(),
                predicted.len()
            )));
        }

        let mut cm = Self::default();
        for (&a, &p) in actual.iter().zip(predicted) {
            match (a, p) {
                (1, 1) => cm.true_positives += 1,
                (0, 1) => cm.false_positives += 1,
                (0, 0) => cm.true_negatives += 1,
                (1, 0) => cm.false_negatives += 1,
                _ => {
                    return Err(ChurnError::InvalidParameters(format!(
                        "labels must be 0 or 1, got actual={a}, predicted={p}"
                    )))
                }
            }
        }
        Ok(cm)
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }
}

/// Held-out evaluation metrics, rounded to four decimals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

impl EvaluationMetrics {
    pub fn from_confusion(cm: &ConfusionMatrix) -> Self {
        let tp = cm.true_positives as f64;
        let precision = ratio(tp, (cm.true_positives + cm.false_positives) as f64);
        let recall = ratio(tp, (cm.true_positives + cm.false_negatives) as f64);

        Self {
            accuracy: round4(ratio(
                (cm.true_positives + cm.true_negatives) as f64,
                cm.total() as f64,
            )),
            precision: round4(precision),
            recall: round4(recall),
            f1_score: round4(ratio(2.0 * precision * recall, precision + recall)),
        }
    }

    /// Name/value pairs in reporting order
    pub fn entries(&self) -> [(&'static str, f64); 4] {
        [
            ("accuracy", self.accuracy),
            ("precision", self.precision),
            ("recall", self.recall),
            ("f1_score", self.f1_score),
        ]
    }
}

/// Confusion matrix and rounded metrics for a labeled prediction set
pub fn evaluate(actual: &[u8], predicted: &[u8]) -> Result<EvaluationMetrics> {
    let cm = ConfusionMatrix::from_labels(actual, predicted)?;
    Ok(EvaluationMetrics::from_confusion(&cm))
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_confusion_matrix() {
        let actual = [1, 1, 1, 0, 0, 0, 0, 1];
        let predicted = [1, 1, 0, 0, 0, 1, 0, 0];

        let m = evaluate(&actual, &predicted).unwrap();
        // tp=2 fp=1 tn=3 fn=2
        assert_eq!(m.accuracy, 0.625);
        assert_eq!(m.precision, 0.6667);
        assert_eq!(m.recall, 0.5);
        assert_eq!(m.f1_score, 0.5714);
    }

    #[test]
    fn test_no_positives_anywhere_is_zero_not_nan() {
        let m = evaluate(&[0, 0, 0], &[0, 0, 0]).unwrap();
        assert_eq!(m.accuracy, 1.0);
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
        assert_eq!(m.f1_score, 0.0);
    }

    #[test]
    fn test_empty_partition_is_all_zero() {
        assert_eq!(evaluate(&[], &[]).unwrap(), EvaluationMetrics::default());
    }

    #[test]
    fn test_length_mismatch_and_bad_labels_rejected() {
        assert!(evaluate(&[0, 1], &[0]).is_err());
        assert!(evaluate(&[2], &[0]).is_err());
    }
}
