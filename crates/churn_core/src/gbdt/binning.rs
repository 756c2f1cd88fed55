//! Quantile binning of feature columns for histogram split search

use crate::matrix::FeatureMatrix;

/// Candidate split thresholds per feature.
///
/// A value lands in bin `b` when exactly `b` thresholds are strictly below
/// it, so `bin(x) <= b` holds exactly when `x <= thresholds[b]`. Trees can
/// therefore store the raw threshold and evaluate unbinned rows.
#[derive(Debug, Clone)]
pub struct FeatureBinner {
    thresholds: Vec<Vec<f64>>,
}

impl FeatureBinner {
    /// Pick at most `max_bins - 1` thresholds per column from its sorted values
    pub fn fit(features: &FeatureMatrix, max_bins: usize) -> Self {
        let max_bins = max_bins.max(2);
        let thresholds = (0..features.n_cols())
            .map(|col| {
                let mut values: Vec<f64> = features.rows().iter().map(|row| row[col]).collect();
                values.sort_by(f64::total_cmp);
                values.dedup();

                // The largest value never separates anything.
                values.pop();
                if values.len() < max_bins {
                    return values;
                }

                let mut picked: Vec<f64> = (1..max_bins)
                    .map(|k| values[k * values.len() / max_bins])
                    .collect();
                picked.dedup();
                picked
            })
            .collect();

        Self { thresholds }
    }

    pub fn n_features(&self) -> usize {
        self.thresholds.len()
    }

    /// Number of bins for a feature (thresholds + 1)
    pub fn n_bins(&self, feature: usize) -> usize {
        self.thresholds[feature].len() + 1
    }

    pub fn threshold(&self, feature: usize, bin: usize) -> f64 {
        self.thresholds[feature][bin]
    }

    pub fn bin(&self, feature: usize, value: f64) -> u16 {
        self.thresholds[feature].partition_point(|&t| t < value) as u16
    }

    /// Column-major bin indices for every row
    pub fn transform(&self, features: &FeatureMatrix) -> Vec<Vec<u16>> {
        (0..self.n_features())
            .map(|col| {
                features
                    .rows()
                    .iter()
                    .map(|row| self.bin(col, row[col]))
                    .collect()
            })
            .collect()
    }
}
