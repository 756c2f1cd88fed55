//! Customer records and delimited-text datasets
//!
//! Reads and writes comma-separated files with a header row and validates
//! every row before it reaches the encoder. A load never recovers partially:
//! the first malformed row fails the whole read.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use crate::encoder::{Column, FeatureTable};
use crate::errors::{ChurnError, Result};

/// Opaque identifier column, never used as a feature
pub const ID_COLUMN: &str = "customer_id";

/// Binary churn label column, present only in labeled data
pub const LABEL_COLUMN: &str = "churned";

/// Categorical columns that are one-hot encoded before training and scoring
pub const CATEGORICAL_COLUMNS: [&str; 3] = ["contract_type", "internet_service", "payment_method"];

pub const CONTRACT_TYPES: [&str; 3] = ["month-to-month", "one-year", "two-year"];
pub const INTERNET_SERVICES: [&str; 3] = ["dsl", "fiber_optic", "no"];
pub const PAYMENT_METHODS: [&str; 4] = [
    "electronic_check",
    "mailed_check",
    "bank_transfer",
    "credit_card",
];

/// Record columns in file order, without the label
pub const RECORD_COLUMNS: [&str; 8] = [
    ID_COLUMN,
    "tenure_months",
    "monthly_charges",
    "total_charges",
    "contract_type",
    "internet_service",
    "payment_method",
    "num_support_tickets",
];

/// Upper bound (inclusive) for `num_support_tickets`
pub const MAX_SUPPORT_TICKETS: i64 = 10;

/// One customer observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub customer_id: String,
    pub tenure_months: i64,
    pub monthly_charges: f64,
    pub total_charges: f64,
    pub contract_type: String,
    pub internet_service: String,
    pub payment_method: String,
    pub num_support_tickets: i64,
    #[serde(default)]
    pub churned: Option<u8>,
}

impl Record {
    /// Check value ranges; `row` is 1-based and only used for reporting
    pub fn validate(&self, row: usize) -> Result<()> {
        let fail = |reason: String| Err(ChurnError::Data { row, reason });

        if self.customer_id.trim().is_empty() {
            return fail("empty customer_id".to_string());
        }
        if self.tenure_months < 1 {
            return fail(format!("tenure_months must be >= 1, got {}", self.tenure_months));
        }
        if !self.monthly_charges.is_finite() || self.monthly_charges < 0.0 {
            return fail(format!(
                "monthly_charges must be a finite value >= 0, got {}",
                self.monthly_charges
            ));
        }
        if !self.total_charges.is_finite() || self.total_charges < 0.0 {
            return fail(format!(
                "total_charges must be a finite value >= 0, got {}",
                self.total_charges
            ));
        }
        if !(0..=MAX_SUPPORT_TICKETS).contains(&self.num_support_tickets) {
            return fail(format!(
                "num_support_tickets must be in [0, {MAX_SUPPORT_TICKETS}], got {}",
                self.num_support_tickets
            ));
        }
        for (name, value) in [
            ("contract_type", &self.contract_type),
            ("internet_service", &self.internet_service),
            ("payment_method", &self.payment_method),
        ] {
            if value.trim().is_empty() {
                return fail(format!("empty {name}"));
            }
        }
        if let Some(label) = self.churned {
            if label > 1 {
                return fail(format!("churned must be 0 or 1, got {label}"));
            }
        }
        Ok(())
    }

    fn to_fields(&self, labeled: bool) -> Vec<String> {
        let mut fields = vec![
            self.customer_id.clone(),
            self.tenure_months.to_string(),
            self.monthly_charges.to_string(),
            self.total_charges.to_string(),
            self.contract_type.clone(),
            self.internet_service.clone(),
            self.payment_method.clone(),
            self.num_support_tickets.to_string(),
        ];
        if labeled {
            fields.push(self.churned.unwrap_or_default().to_string());
        }
        fields
    }
}

/// Ordered collection of records sharing one column set
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
    labeled: bool,
}

impl Dataset {
    /// Build a dataset; either every record carries a label or none does
    pub fn new(records: Vec<Record>) -> Result<Self> {
        let labeled = records.first().map_or(false, |r| r.churned.is_some());
        Self::with_labeling(records, labeled)
    }

    /// Build a dataset whose labeling is fixed up front, so an empty labeled
    /// dataset keeps its `churned` column
    pub fn with_labeling(records: Vec<Record>, labeled: bool) -> Result<Self> {
        for (idx, record) in records.iter().enumerate() {
            record.validate(idx + 1)?;
            if record.churned.is_some() != labeled {
                return Err(ChurnError::Data {
                    row: idx + 1,
                    reason: "mixed labeled and unlabeled records".to_string(),
                });
            }
        }
        Ok(Self { records, labeled })
    }

    /// Load a dataset from a delimited file with a header row
    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ChurnError::Config(format!(
                "input file not found: {}",
                path.display()
            )));
        }

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;
        let headers = reader.headers()?.clone();
        if let Some(unknown) = headers
            .iter()
            .find(|h| *h != LABEL_COLUMN && !RECORD_COLUMNS.contains(h))
        {
            return Err(ChurnError::Data {
                row: 0,
                reason: format!("unknown column in header: {unknown}"),
            });
        }
        let labeled_header = headers.iter().any(|h| h == LABEL_COLUMN);

        let mut records = Vec::new();
        for (idx, row) in reader.deserialize::<Record>().enumerate() {
            let record = row.map_err(|err| ChurnError::Data {
                row: idx + 1,
                reason: err.to_string(),
            })?;
            if labeled_header && record.churned.is_none() {
                return Err(ChurnError::Data {
                    row: idx + 1,
                    reason: "missing churned label".to_string(),
                });
            }
            records.push(record);
        }

        debug!("Read {} records from {}", records.len(), path.display());
        Self::with_labeling(records, labeled_header)
    }

    /// Write the dataset with a header row, creating parent directories
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = create_writer(path.as_ref())?;
        writer.write_record(self.column_names())?;
        for record in &self.records {
            writer.write_record(record.to_fields(self.labeled))?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write the dataset with one extra float column appended to every row
    pub fn write_csv_with_column<P: AsRef<Path>>(
        &self,
        path: P,
        name: &str,
        values: &[f64],
    ) -> Result<()> {
        if values.len() != self.records.len() {
            return Err(ChurnError::InvalidParameters(format!(
                "column {name} has {} values for {} records",
                values.len(),
                self.records.len()
            )));
        }

        let mut writer = create_writer(path.as_ref())?;
        let mut header: Vec<&str> = self.column_names();
        header.push(name);
        writer.write_record(&header)?;
        for (record, value) in self.records.iter().zip(values) {
            let mut fields = record.to_fields(self.labeled);
            fields.push(value.to_string());
            writer.write_record(&fields)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Column names in file order
    pub fn column_names(&self) -> Vec<&'static str> {
        let mut names = RECORD_COLUMNS.to_vec();
        if self.labeled {
            names.push(LABEL_COLUMN);
        }
        names
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn is_labeled(&self) -> bool {
        self.labeled
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First `n` records (fewer if the dataset is shorter)
    pub fn head(&self, n: usize) -> &[Record] {
        &self.records[..n.min(self.records.len())]
    }

    /// Label vector, `None` for unlabeled data
    pub fn labels(&self) -> Option<Vec<u8>> {
        if !self.labeled {
            return None;
        }
        Some(self.records.iter().map(|r| r.churned.unwrap_or_default()).collect())
    }

    /// Fraction of churned records, `None` for unlabeled or empty data
    pub fn churn_rate(&self) -> Option<f64> {
        let labels = self.labels()?;
        if labels.is_empty() {
            return None;
        }
        let positives = labels.iter().filter(|&&l| l == 1).count();
        Some(positives as f64 / labels.len() as f64)
    }

    /// Feature columns in file order, excluding the identifier and label
    pub fn feature_table(&self) -> FeatureTable {
        let numeric = |f: fn(&Record) -> f64| self.records.iter().map(f).collect::<Vec<_>>();
        let text = |f: fn(&Record) -> String| self.records.iter().map(f).collect::<Vec<_>>();

        FeatureTable::new(vec![
            Column::numeric("tenure_months", numeric(|r| r.tenure_months as f64)),
            Column::numeric("monthly_charges", numeric(|r| r.monthly_charges)),
            Column::numeric("total_charges", numeric(|r| r.total_charges)),
            Column::categorical("contract_type", text(|r| r.contract_type.clone())),
            Column::categorical("internet_service", text(|r| r.internet_service.clone())),
            Column::categorical("payment_method", text(|r| r.payment_method.clone())),
            Column::numeric("num_support_tickets", numeric(|r| r.num_support_tickets as f64)),
        ])
    }
}

fn create_writer(path: &Path) -> Result<csv::Writer<std::fs::File>> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(csv::Writer::from_path(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn record(id: &str, churned: Option<u8>) -> Record {
        Record {
            customer_id: id.to_string(),
            tenure_months: 12,
            monthly_charges: 70.5,
            total_charges: 846.0,
            contract_type: "one-year".to_string(),
            internet_service: "dsl".to_string(),
            payment_method: "credit_card".to_string(),
            num_support_tickets: 2,
            churned,
        }
    }

    fn create_test_csv(body: &str) -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        write!(file, "{body}")?;
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn test_load_labeled_csv() -> Result<()> {
        let file = create_test_csv(
            "customer_id,tenure_months,monthly_charges,total_charges,contract_type,internet_service,payment_method,num_support_tickets,churned\n\
             CUST-00001,5,90.0,450.0,month-to-month,fiber_optic,electronic_check,7,1\n\
             CUST-00002,48,55.0,2640.0,two-year,dsl,bank_transfer,1,0\n",
        )?;
        let dataset = Dataset::read_csv(file.path())?;

        assert_eq!(dataset.len(), 2);
        assert!(dataset.is_labeled());
        assert_eq!(dataset.labels(), Some(vec![1, 0]));
        assert_eq!(dataset.churn_rate(), Some(0.5));
        assert_eq!(dataset.records()[0].contract_type, "month-to-month");
        Ok(())
    }

    #[test]
    fn test_load_unlabeled_csv() -> Result<()> {
        let file = create_test_csv(
            "customer_id,tenure_months,monthly_charges,total_charges,contract_type,internet_service,payment_method,num_support_tickets\n\
             CUST-10001,5,90.0,450.0,month-to-month,fiber_optic,electronic_check,7\n",
        )?;
        let dataset = Dataset::read_csv(file.path())?;

        assert!(!dataset.is_labeled());
        assert_eq!(dataset.labels(), None);
        assert_eq!(dataset.column_names().len(), RECORD_COLUMNS.len());
        Ok(())
    }

    #[test]
    fn test_malformed_row_fails_whole_load() -> Result<()> {
        let file = create_test_csv(
            "customer_id,tenure_months,monthly_charges,total_charges,contract_type,internet_service,payment_method,num_support_tickets\n\
             CUST-10001,5,90.0,450.0,month-to-month,fiber_optic,electronic_check,7\n\
             CUST-10002,abc,90.0,450.0,month-to-month,fiber_optic,electronic_check,7\n",
        )?;
        let err = Dataset::read_csv(file.path()).unwrap_err();
        assert!(matches!(err, ChurnError::Data { row: 2, .. }), "{err}");
        Ok(())
    }

    #[test]
    fn test_unknown_header_rejected() -> Result<()> {
        let file = create_test_csv(
            "customer_id,tenure_months,monthly_charges,total_charges,contract_type,internet_service,payment_method,num_support_tickets,region\n\
             CUST-10001,5,90.0,450.0,month-to-month,fiber_optic,electronic_check,7,north\n",
        )?;
        let err = Dataset::read_csv(file.path()).unwrap_err();
        assert!(matches!(err, ChurnError::Data { row: 0, .. }), "{err}");
        Ok(())
    }

    #[test]
    fn test_empty_labeled_file_keeps_label_column() -> Result<()> {
        let dir = TempDir::new()?;
        let input = dir.path().join("empty.csv");
        std::fs::write(
            &input,
            "customer_id,tenure_months,monthly_charges,total_charges,contract_type,internet_service,payment_method,num_support_tickets,churned\n",
        )?;

        let dataset = Dataset::read_csv(&input)?;
        assert!(dataset.is_empty());
        assert!(dataset.is_labeled());
        assert_eq!(dataset.column_names().last(), Some(&LABEL_COLUMN));

        let output = dir.path().join("copy.csv");
        dataset.write_csv(&output)?;
        assert_eq!(Dataset::read_csv(&output)?, dataset);
        Ok(())
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let mut bad = record("CUST-1", None);
        bad.num_support_tickets = 11;
        assert!(bad.validate(1).is_err());

        let mut bad = record("CUST-1", None);
        bad.tenure_months = 0;
        assert!(bad.validate(1).is_err());

        let bad = record("CUST-1", Some(2));
        assert!(bad.validate(1).is_err());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = Dataset::read_csv("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, ChurnError::Config(_)));
    }

    #[test]
    fn test_mixed_labels_rejected() {
        let result = Dataset::new(vec![record("A", Some(1)), record("B", None)]);
        assert!(result.is_err());
    }

    #[test]
    fn test_write_then_read_preserves_records() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("nested").join("data.csv");
        let dataset = Dataset::new(vec![record("A", Some(1)), record("B", Some(0))])?;

        dataset.write_csv(&path)?;
        let loaded = Dataset::read_csv(&path)?;

        assert_eq!(dataset, loaded);
        Ok(())
    }

    #[test]
    fn test_feature_table_excludes_id_and_label() {
        let dataset = Dataset::new(vec![record("A", Some(1))]).unwrap();
        let table = dataset.feature_table();
        let names: Vec<&str> = table.columns().iter().map(|c| c.name()).collect();
        assert!(!names.contains(&ID_COLUMN));
        assert!(!names.contains(&LABEL_COLUMN));
        assert_eq!(names.len(), 7);
    }
}
