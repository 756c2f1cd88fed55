//! End-to-end pipeline steps shared by the command-line tools

use churn_core::{
    encode_dataset, generate, ChurnError, Dataset, EvaluationMetrics, FeatureSchema,
    GbdtClassifier, GbdtTrainer, Record,
};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::artifacts::{describe_model, ArtifactPaths, ModelArtifact};
use crate::config::PipelineConfig;
use crate::errors::Result;
use crate::scoring::ScoringEngine;
use crate::trainer::train_and_evaluate;

/// File name of the generated inference batch
pub const INFERENCE_FILE: &str = "inference_input.csv";

/// Summary of a training run
#[derive(Debug, Clone)]
pub struct TrainingReport {
    pub sample_count: usize,
    pub churn_rate: f64,
    pub schema: FeatureSchema,
    pub metrics: EvaluationMetrics,
    pub train_size: usize,
    pub test_size: usize,
    pub paths: ArtifactPaths,
    pub model: GbdtClassifier,
}

/// Generate labeled data, fit and evaluate a model, and persist the artifact
/// into `config.training.output_dir`
pub fn run_training(config: &PipelineConfig) -> Result<TrainingReport> {
    config.validate()?;
    let settings = &config.training;

    info!(
        "Generating {} training records (seed={})",
        settings.n_samples, settings.seed
    );
    let dataset = generate(&config.training_generator())?;
    let churn_rate = dataset.churn_rate().unwrap_or_default();
    let labels = dataset
        .labels()
        .ok_or_else(|| ChurnError::Config("training data has no churned column".to_string()))?;
    info!("Churn rate: {:.2}%", churn_rate * 100.0);

    let encoded = encode_dataset(&dataset)?;
    let schema = FeatureSchema::from_encoded(&encoded)?;
    let features = schema.align(&encoded);
    info!("Feature schema: {} columns", schema.len());

    let learner = GbdtTrainer::new(config.booster.clone());
    let outcome = train_and_evaluate(
        &learner,
        &features,
        &labels,
        settings.seed,
        settings.test_fraction,
    )?;

    let metadata = describe_model(
        &settings.model_name,
        &schema,
        dataset.len(),
        outcome.metrics,
        settings.seed,
    );
    let artifact = ModelArtifact::new(outcome.model, metadata)?;
    let paths = artifact.save(&settings.output_dir)?;
    let (model, schema, _) = artifact.into_parts();

    Ok(TrainingReport {
        sample_count: dataset.len(),
        churn_rate,
        schema,
        metrics: outcome.metrics,
        train_size: outcome.train_size,
        test_size: outcome.test_size,
        paths,
        model,
    })
}

/// Generate the unlabeled inference batch and write it under
/// `config.inference.output_dir`
pub fn generate_inference_data(config: &PipelineConfig) -> Result<(Dataset, PathBuf)> {
    config.validate()?;
    let settings = &config.inference;

    info!(
        "Generating {} inference records (seed={}, id_offset={})",
        settings.n_samples, settings.seed, settings.id_offset
    );
    let dataset = generate(&config.inference_generator())?;
    let path = settings.output_dir.join(INFERENCE_FILE);
    dataset.write_csv(&path)?;
    info!("Saved {} records to: {}", dataset.len(), path.display());

    Ok((dataset, path))
}

/// Score a CSV file and write the result, returning the row count
pub fn score_file(input: &Path, model_dir: &Path, output: &Path) -> Result<usize> {
    let engine = ScoringEngine::load(model_dir)?;
    let dataset = Dataset::read_csv(input)?;
    info!("Loaded {} records from: {}", dataset.len(), input.display());

    let scored = engine.score(&dataset)?;
    scored.write_csv(output)?;
    info!("Saved predictions to: {}", output.display());
    Ok(scored.len())
}

/// Fixed customer profiles used by the smoke check
pub fn sample_customers() -> Result<Dataset> {
    let profiles: [(i64, f64, f64, &str, &str, &str, i64); 5] = [
        (5, 90.0, 450.0, "month-to-month", "fiber_optic", "electronic_check", 7),
        (48, 55.0, 2640.0, "two-year", "dsl", "bank_transfer", 1),
        (12, 75.0, 900.0, "one-year", "fiber_optic", "credit_card", 3),
        (2, 110.0, 220.0, "month-to-month", "fiber_optic", "mailed_check", 9),
        (60, 30.0, 1800.0, "two-year", "no", "bank_transfer", 0),
    ];

    let records = profiles
        .iter()
        .enumerate()
        .map(
            |(i, &(tenure, monthly, total, contract, internet, payment, tickets))| Record {
                customer_id: format!("SAMPLE-{}", i + 1),
                tenure_months: tenure,
                monthly_charges: monthly,
                total_charges: total,
                contract_type: contract.to_string(),
                internet_service: internet.to_string(),
                payment_method: payment.to_string(),
                num_support_tickets: tickets,
                churned: None,
            },
        )
        .collect();
    Ok(Dataset::new(records)?)
}
