//! Batch scoring CLI
//!
//! Takes three positional arguments so it can be invoked unchanged by a job
//! runner: input CSV, model artifact directory, output CSV.

use anyhow::{Context, Result};
use churn_trainer::logging::{init_tracing, RULE};
use churn_trainer::score_file;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "churn-score")]
#[command(author = "Churn Pipeline Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Score a customer CSV with a trained churn model", long_about = None)]
struct Args {
    /// Input CSV of customer records
    input_path: PathBuf,

    /// Model artifact directory (model.bin, model.hash, model_metadata.json)
    model_dir: PathBuf,

    /// Output CSV (input columns plus churn_probability)
    output_path: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose)?;

    info!("Churn Batch Scorer v{}", env!("CARGO_PKG_VERSION"));
    info!("{RULE}");
    info!("  Input: {}", args.input_path.display());
    info!("  Model: {}", args.model_dir.display());
    info!("  Output: {}", args.output_path.display());

    let rows = score_file(&args.input_path, &args.model_dir, &args.output_path)
        .context("Scoring failed")?;

    info!("{RULE}");
    info!("✓ Scored {} records", rows);

    Ok(())
}
