//! Feature schema: the ordered column contract between training and scoring
//!
//! A schema is captured once from the encoded training matrix and persisted
//! next to the fitted classifier. At scoring time every encoded batch is
//! projected onto it with [`FeatureSchema::align`], which yields exactly the
//! trained column set in the trained order no matter which categories the
//! batch contains.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::classifier::{ensure_width, Classifier};
use crate::dataset::{ID_COLUMN, LABEL_COLUMN};
use crate::errors::{ChurnError, Result};
use crate::matrix::FeatureMatrix;
use crate::serialization::hash_canonical_hex;

/// Current schema format version
pub const SCHEMA_VERSION: u32 = 1;

/// Ordered, unique list of expected feature columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    version: u32,
    columns: Vec<String>,
}

impl FeatureSchema {
    pub fn new(columns: Vec<String>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        for name in &columns {
            if name.is_empty() {
                return Err(ChurnError::Config("empty feature column name".to_string()));
            }
            if !seen.insert(name.as_str()) {
                return Err(ChurnError::Config(format!(
                    "duplicate feature column in schema: {name}"
                )));
            }
        }
        Ok(Self {
            version: SCHEMA_VERSION,
            columns,
        })
    }

    /// Capture the column order of an encoded matrix, skipping identifier and label columns
    pub fn from_encoded(encoded: &FeatureMatrix) -> Result<Self> {
        let columns = encoded
            .columns()
            .iter()
            .filter(|c| c.as_str() != ID_COLUMN && c.as_str() != LABEL_COLUMN)
            .cloned()
            .collect();
        Self::new(columns)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// BLAKE3 fingerprint of the canonical schema document
    pub fn fingerprint(&self) -> Result<String> {
        Ok(hash_canonical_hex(self)?)
    }

    /// Check that a classifier was fitted on exactly this schema.
    ///
    /// Width is compared first, then the column fingerprint, so a reordered
    /// or renamed column set of the same width is still rejected.
    pub fn verify_classifier<C: Classifier + ?Sized>(&self, model: &C) -> Result<()> {
        if model.n_features() != self.len() {
            return Err(ChurnError::SchemaMismatch {
                expected: model.n_features(),
                actual: self.len(),
            });
        }
        let fingerprint = self.fingerprint()?;
        if model.feature_fingerprint() != fingerprint {
            return Err(ChurnError::FingerprintMismatch {
                model: model.feature_fingerprint().to_string(),
                schema: fingerprint,
            });
        }
        Ok(())
    }

    /// Align `encoded` and confirm the result has the classifier's width
    pub fn align_for<C: Classifier + ?Sized>(
        &self,
        model: &C,
        encoded: &FeatureMatrix,
    ) -> Result<FeatureMatrix> {
        let aligned = self.align(encoded);
        ensure_width(model.n_features(), &aligned)?;
        Ok(aligned)
    }

    /// True when the matrix columns equal the schema, in order
    pub fn matches(&self, matrix: &FeatureMatrix) -> bool {
        matrix.columns() == self.columns.as_slice()
    }

    /// Project an encoded matrix onto this schema.
    ///
    /// Schema columns missing from `encoded` are filled with 0, columns not in
    /// the schema are dropped, and the result follows schema order. Never
    /// fails; aligning an aligned matrix returns it unchanged.
    pub fn align(&self, encoded: &FeatureMatrix) -> FeatureMatrix {
        let positions: HashMap<&str, usize> = encoded
            .columns()
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.as_str(), idx))
            .collect();

        let sources: Vec<Option<usize>> = self
            .columns
            .iter()
            .map(|name| positions.get(name.as_str()).copied())
            .collect();

        let missing = sources.iter().filter(|s| s.is_none()).count();
        if missing > 0 {
            debug!("Filling {missing} absent schema columns with 0");
        }
        let dropped: Vec<&str> = encoded
            .columns()
            .iter()
            .map(String::as_str)
            .filter(|name| !self.columns.iter().any(|c| c == name))
            .collect();
        if !dropped.is_empty() {
            warn!("Dropping {} columns unknown to the schema: {:?}", dropped.len(), dropped);
        }

        let rows = encoded
            .rows()
            .iter()
            .map(|row| {
                sources
                    .iter()
                    .map(|src| src.map_or(0.0, |idx| row[idx]))
                    .collect()
            })
            .collect();

        FeatureMatrix::from_aligned(self.columns.clone(), rows)
    }
}
