//! Model smoke check: scores a handful of fixed customer profiles

use anyhow::{Context, Result};
use churn_trainer::logging::{init_tracing, RULE};
use churn_trainer::{sample_customers, ScoringEngine};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "churn-smoke")]
#[command(author = "Churn Pipeline Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Score fixed sample customers against a trained model", long_about = None)]
struct Args {
    /// Model artifact directory
    #[arg(long, default_value = "artifacts")]
    model_path: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose)?;

    info!("Churn Model Smoke Check v{}", env!("CARGO_PKG_VERSION"));
    info!("{RULE}");

    let engine = ScoringEngine::load(&args.model_path)
        .with_context(|| format!("Failed to load model from {}", args.model_path.display()))?;
    let samples = sample_customers()?;
    let scored = engine.score(&samples).context("Failed to score samples")?;

    info!(
        "{:<10} {:>6} {:>8} {:<15} {:<12} {:<17} {:>7} {:>11} {:>5}",
        "customer", "tenure", "monthly", "contract", "internet", "payment", "tickets", "probability", "churn"
    );
    for ((record, probability), label) in samples
        .records()
        .iter()
        .zip(&scored.probabilities)
        .zip(&scored.predictions)
    {
        info!(
            "{:<10} {:>6} {:>8.2} {:<15} {:<12} {:<17} {:>7} {:>11.4} {:>5}",
            record.customer_id,
            record.tenure_months,
            record.monthly_charges,
            record.contract_type,
            record.internet_service,
            record.payment_method,
            record.num_support_tickets,
            probability,
            label
        );
    }

    info!("{RULE}");
    info!("✓ Model smoke check passed");

    Ok(())
}
