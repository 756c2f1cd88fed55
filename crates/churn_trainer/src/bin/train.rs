//! Churn model trainer CLI
//!
//! Generates a labeled customer pool, fits the boosted-tree classifier and
//! writes the model artifact directory.

use anyhow::{Context, Result};
use churn_trainer::logging::{init_tracing, RULE};
use churn_trainer::{run_training, PipelineConfig};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "churn-train")]
#[command(author = "Churn Pipeline Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Train and evaluate the churn classifier", long_about = None)]
struct Args {
    /// Random seed for data generation and the train/test split [default: 42]
    #[arg(long)]
    seed: Option<u64>,

    /// Number of training records to generate [default: 10000]
    #[arg(long)]
    n_samples: Option<usize>,

    /// Output directory for model artifacts [default: artifacts]
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Pipeline configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose)?;

    let mut config = PipelineConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(seed) = args.seed {
        config.training.seed = seed;
    }
    if let Some(n_samples) = args.n_samples {
        config.training.n_samples = n_samples;
    }
    if let Some(output_dir) = args.output_dir {
        config.training.output_dir = output_dir;
    }

    info!("Churn Model Trainer v{}", env!("CARGO_PKG_VERSION"));
    info!("{RULE}");
    info!("Training configuration:");
    info!("  Samples: {}", config.training.n_samples);
    info!("  Seed: {}", config.training.seed);
    info!("  Test fraction: {}", config.training.test_fraction);
    info!("  Trees: {}", config.booster.num_trees);
    info!("  Max depth: {}", config.booster.max_depth);
    info!("  Learning rate: {}", config.booster.learning_rate);
    info!("{RULE}");

    let report = run_training(&config).context("Training failed")?;

    info!("{RULE}");
    info!("✓ Training completed successfully");
    info!("  Records: {} ({} train / {} test)", report.sample_count, report.train_size, report.test_size);
    info!("  Churn rate: {:.2}%", report.churn_rate * 100.0);
    info!("  Features: {}", report.schema.len());
    info!("  Trees: {}", report.model.num_trees());
    info!("Model performance:");
    for (name, value) in report.metrics.entries() {
        info!("  {}: {:.4}", name, value);
    }
    info!("  Model: {}", report.paths.model.display());
    info!("  Hash: {}", report.paths.hash.display());
    info!("  Metadata: {}", report.paths.metadata.display());

    Ok(())
}
