//! Pipeline configuration loaded from TOML
//!
//! Every section falls back to its defaults, so an empty file or a file with
//! a single overridden key is valid.

use churn_core::generator::{id_range, INFERENCE_ID_OFFSET, TRAINING_ID_OFFSET};
use churn_core::{ChurnRates, GbdtConfig, GeneratorConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{Result, TrainerError};
use crate::trainer::DEFAULT_TEST_FRACTION;

/// Default model name recorded in artifact metadata
pub const DEFAULT_MODEL_NAME: &str = "churn_prediction_gbdt";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingSettings {
    pub n_samples: usize,
    pub seed: u64,
    pub test_fraction: f64,
    pub output_dir: PathBuf,
    pub model_name: String,
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            n_samples: 10_000,
            seed: 42,
            test_fraction: DEFAULT_TEST_FRACTION,
            output_dir: PathBuf::from("artifacts"),
            model_name: DEFAULT_MODEL_NAME.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceSettings {
    pub n_samples: usize,
    pub seed: u64,
    pub id_offset: u64,
    pub output_dir: PathBuf,
}

impl Default for InferenceSettings {
    fn default() -> Self {
        Self {
            n_samples: 500,
            seed: 123,
            id_offset: INFERENCE_ID_OFFSET,
            output_dir: PathBuf::from("data"),
        }
    }
}

/// Full pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub training: TrainingSettings,
    pub inference: InferenceSettings,
    pub churn_rates: ChurnRates,
    pub booster: GbdtConfig,
}

impl PipelineConfig {
    /// Load and validate a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(TrainerError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!("Loaded pipeline config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, or the file at `path` when one is given
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.training.n_samples == 0 {
            return Err(TrainerError::Config(
                "training.n_samples must be positive".to_string(),
            ));
        }
        if self.inference.n_samples == 0 {
            return Err(TrainerError::Config(
                "inference.n_samples must be positive".to_string(),
            ));
        }
        let fraction = self.training.test_fraction;
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(TrainerError::Config(format!(
                "training.test_fraction must be in (0, 1), got {fraction}"
            )));
        }
        if self.training.model_name.trim().is_empty() {
            return Err(TrainerError::Config(
                "training.model_name must not be empty".to_string(),
            ));
        }
        let training_ids = id_range(TRAINING_ID_OFFSET, self.training.n_samples)?;
        let inference_ids = id_range(self.inference.id_offset, self.inference.n_samples)?;
        if training_ids.start < inference_ids.end && inference_ids.start < training_ids.end {
            return Err(TrainerError::Config(format!(
                "inference ids {}..{} overlap training ids {}..{}",
                inference_ids.start, inference_ids.end, training_ids.start, training_ids.end
            )));
        }
        self.churn_rates.validate()?;
        self.booster.validate()?;
        Ok(())
    }

    /// Generator inputs for the labeled training pool
    pub fn training_generator(&self) -> GeneratorConfig {
        GeneratorConfig {
            rates: self.churn_rates.clone(),
            ..GeneratorConfig::training(self.training.n_samples, self.training.seed)
        }
    }

    /// Generator inputs for the unlabeled inference pool
    pub fn inference_generator(&self) -> GeneratorConfig {
        GeneratorConfig {
            id_offset: self.inference.id_offset,
            rates: self.churn_rates.clone(),
            ..GeneratorConfig::inference(self.inference.n_samples, self.inference.seed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use churn_core::ChurnError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.training.n_samples, 10_000);
        assert_eq!(config.training.seed, 42);
        assert_eq!(config.training.test_fraction, 0.2);
        assert_eq!(config.training.output_dir, PathBuf::from("artifacts"));
        assert_eq!(config.inference.n_samples, 500);
        assert_eq!(config.inference.seed, 123);
        assert_eq!(config.inference.id_offset, 10_000);
        assert_eq!(config.inference.output_dir, PathBuf::from("data"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
[training]
seed = 7

[booster]
num_trees = 10
"#,
        )
        .unwrap();
        assert_eq!(config.training.seed, 7);
        assert_eq!(config.training.n_samples, 10_000);
        assert_eq!(config.booster.num_trees, 10);
        assert_eq!(config.booster.max_depth, GbdtConfig::default().max_depth);
        assert_eq!(config.churn_rates, ChurnRates::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[inference]\nn_samples = 50\nid_offset = 20000").unwrap();
        file.flush().unwrap();

        let config = PipelineConfig::load(file.path()).unwrap();
        assert_eq!(config.inference.n_samples, 50);
        let generator = config.inference_generator();
        assert_eq!(generator.id_offset, 20_000);
        assert!(!generator.labeled);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = PipelineConfig::load(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(TrainerError::Config(_))));
    }

    #[test]
    fn test_invalid_values_rejected() {
        for text in [
            "[training]\ntest_fraction = 1.0",
            "[training]\ntest_fraction = 0.0",
            "[training]\nn_samples = 0",
            "[inference]\nn_samples = 0",
        ] {
            assert!(
                matches!(PipelineConfig::from_toml_str(text), Err(TrainerError::Config(_))),
                "accepted: {text}"
            );
        }

        let result = PipelineConfig::from_toml_str("[booster]\nlearning_rate = 0.0");
        assert!(matches!(
            result,
            Err(TrainerError::Core(ChurnError::Config(_)))
        ));

        let result = PipelineConfig::from_toml_str("[churn_rates]\nbase = 2000000");
        assert!(matches!(
            result,
            Err(TrainerError::Core(ChurnError::Config(_)))
        ));
    }

    #[test]
    fn test_overlapping_id_pools_rejected() {
        let result = PipelineConfig::from_toml_str("[training]\nn_samples = 10200");
        assert!(matches!(result, Err(TrainerError::Config(_))));

        let result = PipelineConfig::from_toml_str("[inference]\nid_offset = 9999");
        assert!(matches!(result, Err(TrainerError::Config(_))));

        let config = PipelineConfig::from_toml_str(
            "[training]\nn_samples = 2000\n[inference]\nid_offset = 2000",
        )
        .unwrap();
        assert_eq!(config.inference_generator().id_offset, 2_000);

        let result = PipelineConfig::from_toml_str("[inference]\nid_offset = 99999");
        assert!(matches!(
            result,
            Err(TrainerError::Core(ChurnError::InvalidParameters(_)))
        ));
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let result = PipelineConfig::from_toml_str("[training\nseed = 1");
        assert!(matches!(result, Err(TrainerError::Toml(_))));
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/pipeline.toml");
        assert_eq!(PipelineConfig::load(path).unwrap(), PipelineConfig::default());
    }

    #[test]
    fn test_training_generator_uses_configured_rates() {
        let mut config = PipelineConfig::default();
        config.churn_rates.base = 0;
        let generator = config.training_generator();
        assert!(generator.labeled);
        assert_eq!(generator.id_offset, 0);
        assert_eq!(generator.rates.base, 0);
        assert_eq!(generator.n_samples, 10_000);
    }
}
