//! Inference data generator CLI

use anyhow::{Context, Result};
use churn_trainer::logging::{init_tracing, RULE};
use churn_trainer::{generate_inference_data, PipelineConfig};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Rows shown after generation
const PREVIEW_ROWS: usize = 5;

#[derive(Parser, Debug)]
#[command(name = "churn-generate")]
#[command(author = "Churn Pipeline Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate unlabeled customer records for batch scoring", long_about = None)]
struct Args {
    /// Random seed [default: 123]
    #[arg(long)]
    seed: Option<u64>,

    /// Number of records to generate [default: 500]
    #[arg(long)]
    n_samples: Option<usize>,

    /// Output directory for inference_input.csv [default: data]
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
        config.inference.seed = seed;
    }
    if let Some(n_samples) = args.n_samples {
        config.inference.n_samples = n_samples;
    }
    if let Some(output_dir) = args.output_dir {
        config.inference.output_dir = output_dir;
    }

    info!("Churn Inference Data Generator v{}", env!("CARGO_PKG_VERSION"));
    info!("{RULE}");

    let (dataset, path) =
        generate_inference_data(&config).context("Failed to generate inference data")?;

    info!("{RULE}");
    info!("✓ Wrote {} records to {}", dataset.len(), path.display());
    info!("First {} rows:", PREVIEW_ROWS.min(dataset.len()));
    info!("  {}", dataset.column_names().join(", "));
    for record in dataset.head(PREVIEW_ROWS) {
        info!(
            "  {}, {}, {:.2}, {:.2}, {}, {}, {}, {}",
            record.customer_id,
            record.tenure_months,
            record.monthly_charges,
            record.total_charges,
            record.contract_type,
            record.internet_service,
            record.payment_method,
            record.num_support_tickets
        );
    }

    Ok(())
}
