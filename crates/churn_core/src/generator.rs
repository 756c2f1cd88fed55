//! Synthetic customer generator with a parameterized churn model
//!
//! Draw order is fixed and part of the output contract: tenure, monthly
//! charges, charge noise, contract, internet service, payment method, support
//! tickets and finally (labeled data only) the churn trial. Changing the order
//! changes every generated value for a given seed.

use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::debug;

use crate::dataset::{Dataset, Record, CONTRACT_TYPES, INTERNET_SERVICES, PAYMENT_METHODS};
use crate::errors::{ChurnError, Result};
use crate::random::DeterministicRng;

/// Fixed-point scale for churn probabilities (1e6 = probability 1.0)
pub const PROBABILITY_SCALE: i64 = 1_000_000;

/// ID offset of the training pool (`CUST-00001` onwards)
pub const TRAINING_ID_OFFSET: u64 = 0;

/// ID offset of the inference pool (`CUST-10001` onwards)
pub const INFERENCE_ID_OFFSET: u64 = 10_000;

/// Churn-probability rules, in fixed-point micro-units.
///
/// Applied in order: month-to-month contracts overwrite the base rate,
/// electronic-check payment raises it to a floor, fiber service with many
/// support tickets adds an uplift capped at 1.0, and long tenure scales the
/// result down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChurnRates {
    pub base: i64,
    pub month_to_month: i64,
    pub electronic_check_floor: i64,
    pub fiber_ticket_uplift: i64,
    /// Uplift applies when tickets are strictly above this value
    pub ticket_threshold: i64,
    /// Tenure factor applies when tenure is strictly above this value
    pub tenure_threshold: i64,
    pub long_tenure_factor: i64,
}

impl Default for ChurnRates {
    fn default() -> Self {
        Self {
            base: 150_000,
            month_to_month: 400_000,
            electronic_check_floor: 350_000,
            fiber_ticket_uplift: 200_000,
            ticket_threshold: 5,
            tenure_threshold: 36,
            long_tenure_factor: 500_000,
        }
    }
}

impl ChurnRates {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("base", self.base),
            ("month_to_month", self.month_to_month),
            ("electronic_check_floor", self.electronic_check_floor),
            ("fiber_ticket_uplift", self.fiber_ticket_uplift),
            ("long_tenure_factor", self.long_tenure_factor),
        ] {
            if !(0..=PROBABILITY_SCALE).contains(&value) {
                return Err(ChurnError::Config(format!(
                    "churn rate {name} must be in [0, {PROBABILITY_SCALE}], got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Churn probability in micro-units for one customer profile
    pub fn probability_micros(
        &self,
        contract_type: &str,
        internet_service: &str,
        payment_method: &str,
        num_support_tickets: i64,
        tenure_months: i64,
    ) -> i64 {
        let mut p = self.base;

        if contract_type == "month-to-month" {
            p = self.month_to_month;
        }
        if payment_method == "electronic_check" {
            p = p.max(self.electronic_check_floor);
        }
        if internet_service == "fiber_optic" && num_support_tickets > self.ticket_threshold {
            p = (p + self.fiber_ticket_uplift).min(PROBABILITY_SCALE);
        }
        if tenure_months > self.tenure_threshold {
            p = ((p as i128 * self.long_tenure_factor as i128) / PROBABILITY_SCALE as i128) as i64;
        }

        p
    }

    /// Churn probability of a record as a float in [0, 1]
    pub fn probability(&self, record: &Record) -> f64 {
        self.probability_micros(
            &record.contract_type,
            &record.internet_service,
            &record.payment_method,
            record.num_support_tickets,
            record.tenure_months,
        ) as f64
            / PROBABILITY_SCALE as f64
    }
}

/// Generator inputs
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub n_samples: usize,
    pub seed: u64,
    pub id_offset: u64,
    pub labeled: bool,
    pub rates: ChurnRates,
}

impl GeneratorConfig {
    /// Labeled training pool
    pub fn training(n_samples: usize, seed: u64) -> Self {
        Self {
            n_samples,
            seed,
            id_offset: TRAINING_ID_OFFSET,
            labeled: true,
            rates: ChurnRates::default(),
        }
    }

    /// Unlabeled inference pool with a disjoint ID range
    pub fn inference(n_samples: usize, seed: u64) -> Self {
        Self {
            n_samples,
            seed,
            id_offset: INFERENCE_ID_OFFSET,
            labeled: false,
            rates: ChurnRates::default(),
        }
    }
}

/// Largest customer number that still fits the five-digit id format
pub const MAX_CUSTOMER_NUMBER: u64 = 99_999;

/// Customer numbers `[id_offset + 1, id_offset + n_samples]` used by a pool,
/// as a half-open range. Fails when the range leaves the five-digit format.
pub fn id_range(id_offset: u64, n_samples: usize) -> Result<Range<u64>> {
    let end = id_offset
        .checked_add(n_samples as u64)
        .filter(|&last| last <= MAX_CUSTOMER_NUMBER)
        .ok_or_else(|| {
            ChurnError::InvalidParameters(format!(
                "id_offset {id_offset} with {n_samples} samples exceeds customer number {MAX_CUSTOMER_NUMBER}"
            ))
        })?;
    Ok(id_offset + 1..end + 1)
}

/// Fixed-width sequential identifier for the `index`-th record of a pool.
/// Callers keep `id_offset + index` below [`MAX_CUSTOMER_NUMBER`] via [`id_range`].
pub fn customer_id(id_offset: u64, index: usize) -> String {
    format!("CUST-{:05}", id_offset + index as u64 + 1)
}

/// Generate a synthetic dataset
pub fn generate(config: &GeneratorConfig) -> Result<Dataset> {
    let n = config.n_samples;
    if n == 0 {
        return Err(ChurnError::InvalidParameters(
            "n_samples must be positive".to_string(),
        ));
    }
    config.rates.validate()?;
    id_range(config.id_offset, n)?;

    let mut rng = DeterministicRng::new(config.seed);

    let tenure = rng.integers(1, 73, n)?;
    let monthly = rng.uniform(20.0, 120.0, n)?;
    let noise = rng.normal(0.0, 50.0, n)?;
    let contract = rng.choice(&CONTRACT_TYPES[..], n)?;
    let internet = rng.choice(&INTERNET_SERVICES[..], n)?;
    let payment = rng.choice(&PAYMENT_METHODS[..], n)?;
    let tickets = rng.integers(0, 11, n)?;

    let mut records: Vec<Record> = (0..n)
        .map(|i| Record {
            customer_id: customer_id(config.id_offset, i),
            tenure_months: tenure[i],
            monthly_charges: monthly[i],
            total_charges: (tenure[i] as f64 * monthly[i] + noise[i]).max(0.0),
            contract_type: contract[i].to_string(),
            internet_service: internet[i].to_string(),
            payment_method: payment[i].to_string(),
            num_support_tickets: tickets[i],
            churned: None,
        })
        .collect();

    if config.labeled {
        let probabilities: Vec<f64> = records
            .iter()
            .map(|r| config.rates.probability(r))
            .collect();
        let outcomes = rng.bernoulli(&probabilities)?;
        for (record, churned) in records.iter_mut().zip(outcomes) {
            record.churned = Some(u8::from(churned));
        }
    }

    debug!(
        "Generated {} records (seed={}, id_offset={}, labeled={})",
        n, config.seed, config.id_offset, config.labeled
    );
    Dataset::new(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_rule_ordering_example() {
        let rates = ChurnRates::default();
        let p = rates.probability_micros("month-to-month", "fiber_optic", "electronic_check", 8, 40);
        assert_eq!(p, 300_000);

        let record = Record {
            customer_id: "CUST-00001".into(),
            tenure_months: 40,
            monthly_charges: 80.0,
            total_charges: 3200.0,
            contract_type: "month-to-month".into(),
            internet_service: "fiber_optic".into(),
            payment_method: "electronic_check".into(),
            num_support_tickets: 8,
            churned: None,
        };
        assert_eq!(rates.probability(&record), 0.30);
    }

    #[test]
    fn test_month_to_month_overwrites_rather_than_maxes() {
        let rates = ChurnRates {
            base: 900_000,
            ..ChurnRates::default()
        };
        assert_eq!(rates.probability_micros("month-to-month", "dsl", "credit_card", 0, 1), 400_000);
    }

    #[test]
    fn test_electronic_check_is_a_floor() {
        let rates = ChurnRates::default();
        assert_eq!(rates.probability_micros("one-year", "dsl", "electronic_check", 0, 1), 350_000);
        assert_eq!(rates.probability_micros("month-to-month", "dsl", "electronic_check", 0, 1), 400_000);
    }

    #[test]
    fn test_uplift_thresholds_are_strict() {
        let rates = ChurnRates::default();
        assert_eq!(rates.probability_micros("one-year", "fiber_optic", "credit_card", 5, 36), 150_000);
        assert_eq!(rates.probability_micros("one-year", "fiber_optic", "credit_card", 6, 36), 350_000);
        assert_eq!(rates.probability_micros("one-year", "fiber_optic", "credit_card", 6, 37), 175_000);
    }

    #[test]
    fn test_uplift_caps_at_one() {
        let rates = ChurnRates {
            month_to_month: 950_000,
            ..ChurnRates::default()
        };
        assert_eq!(
            rates.probability_micros("month-to-month", "fiber_optic", "credit_card", 9, 1),
            PROBABILITY_SCALE
        );
    }

    #[test]
    fn test_generation_is_deterministic() {
        let config = GeneratorConfig::training(500, 42);
        assert_eq!(generate(&config).unwrap(), generate(&config).unwrap());

        let other = GeneratorConfig::training(500, 43);
        assert_ne!(generate(&config).unwrap(), generate(&other).unwrap());
    }

    #[test]
    fn test_generated_values_respect_ranges() {
        let dataset = generate(&GeneratorConfig::training(2_000, 7)).unwrap();
        for r in dataset.records() {
            assert!((1..=72).contains(&r.tenure_months));
            assert!((20.0..120.0).contains(&r.monthly_charges));
            assert!(r.total_charges >= 0.0);
            assert!((0..=10).contains(&r.num_support_tickets));
            assert!(CONTRACT_TYPES.contains(&r.contract_type.as_str()));
            assert!(INTERNET_SERVICES.contains(&r.internet_service.as_str()));
            assert!(PAYMENT_METHODS.contains(&r.payment_method.as_str()));
            assert!(matches!(r.churned, Some(0) | Some(1)));
        }
        let rate = dataset.churn_rate().unwrap();
        assert!(rate > 0.1 && rate < 0.4, "churn rate {rate}");
    }

    #[test]
    fn test_inference_pool_is_unlabeled_and_disjoint() {
        let train = generate(&GeneratorConfig::training(10_000, 42)).unwrap();
        let infer = generate(&GeneratorConfig::inference(500, 123)).unwrap();

        assert!(!infer.is_labeled());
        assert_eq!(infer.records()[0].customer_id, "CUST-10001");
        assert_eq!(train.records()[0].customer_id, "CUST-00001");

        let train_ids: HashSet<&str> = train.records().iter().map(|r| r.customer_id.as_str()).collect();
        assert_eq!(train_ids.len(), train.len());
        assert!(infer
            .records()
            .iter()
            .all(|r| !train_ids.contains(r.customer_id.as_str())));
    }

    #[test]
    fn test_labeled_flag_does_not_shift_feature_draws() {
        let mut labeled = GeneratorConfig::training(100, 9);
        labeled.id_offset = 0;
        let mut unlabeled = labeled.clone();
        unlabeled.labeled = false;

        let a = generate(&labeled).unwrap();
        let b = generate(&unlabeled).unwrap();
        for (ra, rb) in a.records().iter().zip(b.records()) {
            assert_eq!(ra.tenure_months, rb.tenure_months);
            assert_eq!(ra.total_charges, rb.total_charges);
            assert_eq!(ra.payment_method, rb.payment_method);
        }
    }

    #[test]
    fn test_id_range_stays_five_digits() {
        assert_eq!(id_range(0, 10_000).unwrap(), 1..10_001);
        assert_eq!(id_range(10_000, 500).unwrap(), 10_001..10_501);
        assert_eq!(id_range(99_000, 999).unwrap(), 99_001..100_000);
        assert!(id_range(99_000, 1_000).is_err());
        assert!(id_range(u64::MAX - 1, 5).is_err());
    }

    #[test]
    fn test_generate_rejects_ids_past_five_digits() {
        let mut config = GeneratorConfig::inference(10, 1);
        config.id_offset = 99_995;
        assert!(matches!(generate(&config), Err(ChurnError::InvalidParameters(_))));

        config.id_offset = u64::MAX;
        assert!(matches!(generate(&config), Err(ChurnError::InvalidParameters(_))));

        config.id_offset = 99_989;
        let dataset = generate(&config).unwrap();
        assert_eq!(dataset.records()[9].customer_id, "CUST-99999");
    }

    #[test]
    fn test_zero_samples_rejected() {
        assert!(generate(&GeneratorConfig::training(0, 1)).is_err());
    }
}
