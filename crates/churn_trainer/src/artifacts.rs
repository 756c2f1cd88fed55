//! Model artifact persistence
//!
//! An artifact directory holds three linked files:
//! - `model.bin`: bincode-encoded classifier
//! - `model.hash`: BLAKE3 hex digest of `model.bin`
//! - `model_metadata.json`: canonical JSON metadata, including the feature schema
//!
//! Loading refuses any directory where the files disagree with each other.

use chrono::{DateTime, Utc};
use churn_core::gbdt::MODEL_TYPE;
use churn_core::serialization::canonical_json_string;
use churn_core::{Classifier, EvaluationMetrics, FeatureSchema, GbdtClassifier};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::errors::{Result, TrainerError};

pub const MODEL_FILE: &str = "model.bin";
pub const HASH_FILE: &str = "model.hash";
pub const METADATA_FILE: &str = "model_metadata.json";

/// Human-readable description of a trained model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_name: String,
    pub model_type: String,
    #[serde(rename = "training_date")]
    pub training_timestamp: DateTime<Utc>,
    #[serde(rename = "num_samples")]
    pub sample_count: usize,
    /// Ordered feature schema the model was fitted on
    #[serde(rename = "features")]
    pub feature_schema: Vec<String>,
    #[serde(rename = "metrics")]
    pub evaluation_metrics: EvaluationMetrics,
    pub random_seed: u64,
}

impl ModelMetadata {
    /// Rebuild and validate the embedded schema
    pub fn schema(&self) -> Result<FeatureSchema> {
        Ok(FeatureSchema::new(self.feature_schema.clone())?)
    }
}

/// Paths written by [`ModelArtifact::save`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub hash: PathBuf,
    pub metadata: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            model: dir.join(MODEL_FILE),
            hash: dir.join(HASH_FILE),
            metadata: dir.join(METADATA_FILE),
        }
    }
}

/// Classifier, schema and metadata that are known to belong together
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    model: GbdtClassifier,
    schema: FeatureSchema,
    metadata: ModelMetadata,
}

impl ModelArtifact {
    /// Pair a classifier with its metadata, rejecting inconsistent inputs
    pub fn new(model: GbdtClassifier, metadata: ModelMetadata) -> Result<Self> {
        model.validate()?;
        if metadata.model_type != model.model_type() {
            return Err(TrainerError::Artifact(format!(
                "metadata describes a {} but the model is a {}",
                metadata.model_type,
                model.model_type()
            )));
        }
        let schema = metadata.schema()?;
        schema.verify_classifier(&model)?;
        Ok(Self {
            model,
            schema,
            metadata,
        })
    }

    pub fn model(&self) -> &GbdtClassifier {
        &self.model
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    pub fn into_parts(self) -> (GbdtClassifier, FeatureSchema, ModelMetadata) {
        (self.model, self.schema, self.metadata)
    }

    /// Write all three files into `dir`, creating it if needed
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<ArtifactPaths> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let paths = ArtifactPaths::in_dir(dir);

        let model_bytes = bincode::serialize(&self.model)?;
        std::fs::write(&paths.model, &model_bytes)?;
        info!("Saving model to: {}", paths.model.display());

        let hash_hex = hash_model_bytes(&model_bytes);
        std::fs::write(&paths.hash, &hash_hex)?;
        debug!("Model hash: {}", hash_hex);

        let metadata_json = canonical_json_string(&self.metadata)?;
        std::fs::write(&paths.metadata, metadata_json)?;
        info!("Saving metadata to: {}", paths.metadata.display());

        Ok(paths)
    }

    /// Load and cross-check an artifact directory
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let paths = ArtifactPaths::in_dir(dir);
        for path in [&paths.model, &paths.hash, &paths.metadata] {
            if !path.is_file() {
                return Err(TrainerError::Config(format!(
                    "missing artifact file: {}",
                    path.display()
                )));
            }
        }

        let model_bytes = std::fs::read(&paths.model)?;
        let expected_hash = std::fs::read_to_string(&paths.hash)?;
        let actual_hash = hash_model_bytes(&model_bytes);
        if expected_hash.trim() != actual_hash {
            return Err(TrainerError::Artifact(format!(
                "model hash mismatch in {}: recorded {}, computed {}",
                dir.display(),
                expected_hash.trim(),
                actual_hash
            )));
        }

        let model: GbdtClassifier = bincode::deserialize(&model_bytes)?;
        let metadata: ModelMetadata =
            serde_json::from_str(&std::fs::read_to_string(&paths.metadata)?)?;

        let artifact = Self::new(model, metadata)?;
        info!(
            "Loaded {} ({} features, {} trees) from {}",
            artifact.metadata.model_name,
            artifact.schema.len(),
            artifact.model.num_trees(),
            dir.display()
        );
        Ok(artifact)
    }
}

/// Metadata for a freshly trained boosted-tree model
pub fn describe_model(
    model_name: &str,
    schema: &FeatureSchema,
    sample_count: usize,
    metrics: EvaluationMetrics,
    random_seed: u64,
) -> ModelMetadata {
    ModelMetadata {
        model_name: model_name.to_string(),
        model_type: MODEL_TYPE.to_string(),
        training_timestamp: Utc::now(),
        sample_count,
        feature_schema: schema.columns().to_vec(),
        evaluation_metrics: metrics,
        random_seed,
    }
}

fn hash_model_bytes(bytes: &[u8]) -> String {
    hex::encode(blake3::hash(bytes).as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use churn_core::{ChurnError, FeatureMatrix, GbdtConfig, GbdtTrainer, Learner};

    fn fitted() -> (GbdtClassifier, FeatureSchema) {
        let columns = vec!["tenure_months".to_string(), "contract_type_one-year".to_string()];
        let rows: Vec<Vec<f64>> = (0..60)
            .map(|i| vec![(i % 12) as f64, (i % 2) as f64])
            .collect();
        let labels: Vec<u8> = rows.iter().map(|r| u8::from(r[0] < 4.0)).collect();
        let features = FeatureMatrix::new(columns.clone(), rows).unwrap();
        let config = GbdtConfig {
            num_trees: 5,
            max_depth: 2,
            min_samples_leaf: 5,
            ..GbdtConfig::default()
        };
        let model = GbdtTrainer::new(config).fit(&features, &labels).unwrap();
        (model, FeatureSchema::new(columns).unwrap())
    }

    fn artifact() -> ModelArtifact {
        let (model, schema) = fitted();
        let metadata = describe_model("test_model", &schema, 60, EvaluationMetrics::default(), 42);
        ModelArtifact::new(model, metadata).unwrap()
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let original = artifact();
        let paths = original.save(dir.path()).unwrap();
        assert!(paths.model.is_file());
        assert_eq!(std::fs::read_to_string(&paths.hash).unwrap().len(), 64);

        let loaded = ModelArtifact::load(dir.path()).unwrap();
        assert_eq!(loaded.model(), original.model());
        assert_eq!(loaded.schema(), original.schema());
        assert_eq!(loaded.metadata(), original.metadata());
    }

    #[test]
    fn test_metadata_uses_document_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let paths = artifact().save(dir.path()).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(paths.metadata).unwrap()).unwrap();

        for key in [
            "model_name",
            "model_type",
            "training_date",
            "num_samples",
            "features",
            "metrics",
            "random_seed",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["model_type"], MODEL_TYPE);
        assert_eq!(json["features"][0], "tenure_months");
        assert!(json["metrics"].get("f1_score").is_some());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let paths = artifact().save(dir.path()).unwrap();
        std::fs::remove_file(paths.hash).unwrap();
        assert!(matches!(
            ModelArtifact::load(dir.path()),
            Err(TrainerError::Config(_))
        ));
    }

    #[test]
    fn test_tampered_model_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let paths = artifact().save(dir.path()).unwrap();
        let mut bytes = std::fs::read(&paths.model).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        std::fs::write(&paths.model, bytes).unwrap();

        assert!(matches!(
            ModelArtifact::load(dir.path()),
            Err(TrainerError::Artifact(_))
        ));
    }

    #[test]
    fn test_schema_out_of_sync_rejected() {
        let (model, _) = fitted();
        let wider = FeatureSchema::new(vec!["a".into(), "b".into(), "c".into()]).unwrap();
        let metadata = describe_model("m", &wider, 60, EvaluationMetrics::default(), 42);
        assert!(matches!(
            ModelArtifact::new(model.clone(), metadata),
            Err(TrainerError::Core(ChurnError::SchemaMismatch { expected: 2, actual: 3 }))
        ));

        let reordered = FeatureSchema::new(vec![
            "contract_type_one-year".into(),
            "tenure_months".into(),
        ])
        .unwrap();
        let metadata = describe_model("m", &reordered, 60, EvaluationMetrics::default(), 42);
        assert!(matches!(
            ModelArtifact::new(model, metadata),
            Err(TrainerError::Core(ChurnError::FingerprintMismatch { .. }))
        ));
    }

    #[test]
    fn test_edited_metadata_schema_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let original = artifact();
        let paths = original.save(dir.path()).unwrap();

        let mut metadata = original.metadata().clone();
        metadata.feature_schema.push("extra_column".into());
        std::fs::write(&paths.metadata, canonical_json_string(&metadata).unwrap()).unwrap();

        assert!(matches!(
            ModelArtifact::load(dir.path()),
            Err(TrainerError::Core(ChurnError::SchemaMismatch { .. }))
        ));
    }
}
