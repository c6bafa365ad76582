//! Run configuration

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::reconciliation::{CandidateIndex, Tolerances};
use crate::types::*;
use crate::utils::validation::validate_tolerances;

/// Pairing policy selectable from configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// First eligible statement in input order
    #[default]
    FirstFit,
    /// Eligible statement with the smallest amount difference
    BestFit,
}

/// Everything needed for one reconciliation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationConfig {
    /// System ledger CSV file
    #[serde(alias = "system_transactions_file")]
    pub ledger_file: PathBuf,
    /// Bank statement CSV files, one feed each. Feed order is the merge order.
    #[serde(alias = "bank_statements_files")]
    pub statement_files: Vec<PathBuf>,
    /// First day of the window (inclusive)
    pub start_date: NaiveDate,
    /// Last day of the window (inclusive)
    pub end_date: NaiveDate,
    #[serde(default)]
    pub tolerances: Tolerances,
    #[serde(default)]
    pub strategy: StrategyKind,
    /// Pre-bucket statements by date before matching
    #[serde(default)]
    pub index_by_date: bool,
}

impl ReconciliationConfig {
    /// Create a configuration with default tolerances and first-fit matching
    pub fn new(
        ledger_file: impl Into<PathBuf>,
        statement_files: Vec<PathBuf>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            ledger_file: ledger_file.into(),
            statement_files,
            start_date,
            end_date,
            tolerances: Tolerances::default(),
            strategy: StrategyKind::default(),
            index_by_date: false,
        }
    }

    /// Parse a configuration from JSON
    pub fn from_json(json: &str) -> ReconciliationResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> ReconciliationResult<Self> {
        let data = fs::read_to_string(path.as_ref())?;
        Self::from_json(&data)
    }

    /// Date window of the run
    pub fn window(&self) -> ReconciliationResult<DateWindow> {
        DateWindow::new(self.start_date, self.end_date)
    }

    pub fn candidate_index(&self) -> CandidateIndex {
        if self.index_by_date {
            CandidateIndex::ByDate
        } else {
            CandidateIndex::FullScan
        }
    }

    /// Check the configuration before any file is read
    pub fn validate(&self) -> ReconciliationResult<()> {
        if self.ledger_file.as_os_str().is_empty() {
            return Err(ReconciliationError::Config(
                "Ledger file path cannot be empty".to_string(),
            ));
        }

        if self.statement_files.is_empty() {
            return Err(ReconciliationError::Config(
                "At least one bank statement file is required".to_string(),
            ));
        }

        self.window()?;
        validate_tolerances(&self.tolerances)
    }
}
