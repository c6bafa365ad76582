//! Core types and data structures for the reconciliation system

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Direction of a system ledger transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    /// Money leaving the account
    #[serde(alias = "debit", alias = "Debit")]
    Debit,
    /// Money entering the account
    #[serde(alias = "credit", alias = "Credit")]
    Credit,
}

/// Internal system-of-record transaction entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRecord {
    /// Identifier, unique within a run
    pub id: String,
    /// Signed transaction amount
    pub amount: BigDecimal,
    /// Debit or credit. Preserved for output, not used for matching.
    pub kind: TransactionKind,
    /// Calendar date the transaction was booked on
    pub date: NaiveDate,
}

impl LedgerRecord {
    /// Create a new ledger record
    pub fn new(
        id: impl Into<String>,
        amount: BigDecimal,
        kind: TransactionKind,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            amount,
            kind,
            date,
        }
    }

    /// Create a debit ledger record
    pub fn debit(id: impl Into<String>, amount: BigDecimal, date: NaiveDate) -> Self {
        Self::new(id, amount, TransactionKind::Debit, date)
    }

    /// Create a credit ledger record
    pub fn credit(id: impl Into<String>, amount: BigDecimal, date: NaiveDate) -> Self {
        Self::new(id, amount, TransactionKind::Credit, date)
    }
}

/// Entry reported by an external bank statement feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementRecord {
    /// Identifier assigned by the bank
    pub id: String,
    /// Reported amount
    pub amount: BigDecimal,
    /// Value date of the entry
    pub date: NaiveDate,
    /// Feed the record came from (file path for CSV feeds)
    pub origin: String,
}

impl StatementRecord {
    /// Create a new statement record
    pub fn new(
        id: impl Into<String>,
        amount: BigDecimal,
        date: NaiveDate,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            amount,
            date,
            origin: origin.into(),
        }
    }
}

/// Inclusive range of calendar dates a run is restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Create a window, rejecting one that ends before it starts
    pub fn new(start: NaiveDate, end: NaiveDate) -> ReconciliationResult<Self> {
        if end < start {
            return Err(ReconciliationError::InvalidDateWindow(format!(
                "end date {} is before start date {}",
                end, start
            )));
        }
        Ok(Self { start, end })
    }

    /// Parse a window from two `YYYY-MM-DD` strings
    pub fn parse(start: &str, end: &str) -> ReconciliationResult<Self> {
        let start = parse_window_date("start", start)?;
        let end = parse_window_date("end", end)?;
        Self::new(start, end)
    }

    /// Whether the date falls inside the window (both ends included)
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

fn parse_window_date(label: &str, value: &str) -> ReconciliationResult<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| {
        ReconciliationError::InvalidDateWindow(format!(
            "cannot parse {} date '{}': {}",
            label, value, e
        ))
    })
}

/// Errors raised while reading a ledger or statement feed
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Cannot open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed CSV in {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Parse failure in {} at line {line}: {message}", path.display())]
    ParseFailure {
        path: PathBuf,
        line: u64,
        message: String,
    },
}

/// Errors that can occur in the reconciliation system
#[derive(Debug, thiserror::Error)]
pub enum ReconciliationError {
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("Invalid date window: {0}")]
    InvalidDateWindow(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Loader task failed: {0}")]
    Task(String),
}

/// Result type for reconciliation operations
pub type ReconciliationResult<T> = Result<T, ReconciliationError>;
