//! Batch scoring against a persisted classifier and schema

use churn_core::{encode_dataset, Classifier, Dataset, FeatureSchema, GbdtClassifier};
use std::path::Path;
use tracing::{debug, info};

use crate::artifacts::ModelArtifact;
use crate::errors::Result;

/// Name of the column appended to scored output
pub const PROBABILITY_COLUMN: &str = "churn_probability";

/// Classifier paired with the schema it was fitted on
///
/// Construction fails unless the pair agrees on width and column
/// fingerprint, so scoring never has to pad or truncate.
#[derive(Debug, Clone)]
pub struct ScoringEngine<C> {
    model: C,
    schema: FeatureSchema,
}

impl<C: Classifier> ScoringEngine<C> {
    pub fn new(model: C, schema: FeatureSchema) -> Result<Self> {
        schema.verify_classifier(&model)?;
        Ok(Self { model, schema })
    }

    pub fn model(&self) -> &C {
        &self.model
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Encode, align and score `dataset`, preserving row order
    pub fn score(&self, dataset: &Dataset) -> Result<ScoredBatch> {
        let encoded = encode_dataset(dataset)?;
        debug!(
            "Encoded {} rows into {} columns (schema has {})",
            encoded.n_rows(),
            encoded.n_cols(),
            self.schema.len()
        );

        let aligned = self.schema.align_for(&self.model, &encoded)?;
        let probabilities = self.model.predict_proba(&aligned)?;
        let predictions = self.model.predict(&aligned)?;

        info!(
            "Scored {} records ({} predicted to churn)",
            probabilities.len(),
            predictions.iter().filter(|&&p| p == 1).count()
        );

        Ok(ScoredBatch {
            records: dataset.clone(),
            probabilities,
            predictions,
        })
    }
}

impl ScoringEngine<GbdtClassifier> {
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self> {
        let (model, schema, _) = artifact.into_parts();
        Self::new(model, schema)
    }

    /// Load the artifact directory at `dir`
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Self::from_artifact(ModelArtifact::load(dir)?)
    }
}

/// Original records with one probability and one label per row
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredBatch {
    pub records: Dataset,
    pub probabilities: Vec<f64>,
    pub predictions: Vec<u8>,
}

impl ScoredBatch {
    pub fn len(&self) -> usize {
        self.probabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probabilities.is_empty()
    }

    /// Write the input columns plus `churn_probability`
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.records
            .write_csv_with_column(path, PROBABILITY_COLUMN, &self.probabilities)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use churn_core::{generate, ChurnError, GbdtConfig, GbdtTrainer, GeneratorConfig, Learner, Record};

    fn engine() -> ScoringEngine<GbdtClassifier> {
        let train = generate(&GeneratorConfig::training(400, 42)).unwrap();
        let encoded = encode_dataset(&train).unwrap();
        let schema = FeatureSchema::from_encoded(&encoded).unwrap();
        let features = schema.align(&encoded);
        let config = GbdtConfig {
            num_trees: 10,
            ..GbdtConfig::default()
        };
        let model = GbdtTrainer::new(config)
            .fit(&features, &train.labels().unwrap())
            .unwrap();
        ScoringEngine::new(model, schema).unwrap()
    }

    fn record(id: &str, contract: &str, internet: &str, payment: &str) -> Record {
        Record {
            customer_id: id.to_string(),
            tenure_months: 12,
            monthly_charges: 70.0,
            total_charges: 840.0,
            contract_type: contract.to_string(),
            internet_service: internet.to_string(),
            payment_method: payment.to_string(),
            num_support_tickets: 2,
            churned: None,
        }
    }

    #[test]
    fn test_single_category_batch_scores() {
        let engine = engine();
        let batch = Dataset::new(vec![
            record("A", "two-year", "dsl", "credit_card"),
            record("B", "two-year", "dsl", "credit_card"),
        ])
        .unwrap();

        let scored = engine.score(&batch).unwrap();
        assert_eq!(scored.len(), 2);
        assert!(scored.probabilities.iter().all(|p| (0.0..=1.0).contains(p)));
        assert_eq!(scored.probabilities[0], scored.probabilities[1]);
        assert_eq!(scored.records, batch);
    }

    #[test]
    fn test_unseen_category_is_dropped() {
        let engine = engine();
        let known = Dataset::new(vec![record("A", "one-year", "dsl", "credit_card")]).unwrap();
        let unseen = Dataset::new(vec![record("A", "one-year", "dsl", "crypto")]).unwrap();

        let p_unseen = engine.score(&unseen).unwrap().probabilities[0];
        assert!((0.0..=1.0).contains(&p_unseen));
        assert!(engine.score(&known).is_ok());
    }

    #[test]
    fn test_empty_batch() {
        let scored = engine().score(&Dataset::new(Vec::new()).unwrap()).unwrap();
        assert!(scored.is_empty());
    }

    #[test]
    fn test_mismatched_schema_rejected() {
        let model = engine().model().clone();
        let schema = FeatureSchema::new(vec!["tenure_months".into()]).unwrap();
        assert!(matches!(
            ScoringEngine::new(model, schema),
            Err(crate::TrainerError::Core(ChurnError::SchemaMismatch { .. }))
        ));
    }

    #[test]
    fn test_scored_csv_appends_probability_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("scored.csv");
        let batch = Dataset::new(vec![record("A", "month-to-month", "fiber_optic", "electronic_check")]).unwrap();

        engine().score(&batch).unwrap().write_csv(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let header = text.lines().next().unwrap();
        assert!(header.ends_with(",churn_probability"));
        assert_eq!(header.split(',').count(), 9);
        assert_eq!(text.lines().count(), 2);
    }
}
