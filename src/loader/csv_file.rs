//! CSV ledger and bank statement readers

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use crate::traits::*;
use crate::types::*;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Ledger row: `trxID,amount,type,transactionTime`
#[derive(Debug, Deserialize)]
struct LedgerRow {
    id: String,
    amount: String,
    kind: TransactionKind,
    transaction_time: String,
}

/// Statement row: `unique_identifier,amount,date`
#[derive(Debug, Deserialize)]
struct StatementRow {
    id: String,
    amount: String,
    date: String,
}

fn csv_reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(input)
}

fn read_row<R: Read>(
    reader: &mut csv::Reader<R>,
    record: &mut csv::StringRecord,
    path: &Path,
) -> Result<bool, LoadError> {
    reader.read_record(record).map_err(|source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_failure(path: &Path, record: &csv::StringRecord, message: String) -> LoadError {
    LoadError::ParseFailure {
        path: path.to_path_buf(),
        line: record.position().map(|p| p.line()).unwrap_or(0),
        message,
    }
}

fn require_id(id: &str) -> Result<(), String> {
    if id.is_empty() {
        return Err("record id is empty".to_string());
    }
    Ok(())
}

fn parse_amount(value: &str) -> Result<BigDecimal, String> {
    BigDecimal::from_str(value).map_err(|e| format!("invalid amount '{}': {}", value, e))
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .map_err(|e| format!("invalid date '{}': {}", value, e))
}

/// Ledger timestamps carry a time of day; only the calendar date is kept.
fn parse_transaction_time(value: &str) -> Result<NaiveDate, String> {
    NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT)
        .map(|timestamp| timestamp.date())
        .or_else(|_| parse_date(value))
        .map_err(|_| format!("invalid transaction time '{}'", value))
}

fn open(path: &Path) -> Result<File, LoadError> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse ledger CSV data, keeping rows dated inside the window
///
/// The first row is a header and is skipped. Columns are read by position.
/// Ids must be non-empty and unique across the whole file, including rows
/// outside the window. `path` is only used for error context.
pub fn parse_ledger<R: Read>(
    input: R,
    path: &Path,
    window: &DateWindow,
) -> Result<Vec<LedgerRecord>, LoadError> {
    let mut reader = csv_reader(input);
    let mut record = csv::StringRecord::new();
    let mut records = Vec::new();
    let mut skipped = 0usize;
    let mut seen = HashSet::new();

    while read_row(&mut reader, &mut record, path)? {
        let row: LedgerRow = record
            .deserialize(None)
            .map_err(|e| parse_failure(path, &record, e.to_string()))?;
        require_id(&row.id).map_err(|m| parse_failure(path, &record, m))?;
        if !seen.insert(row.id.clone()) {
            return Err(parse_failure(
                path,
                &record,
                format!("duplicate record id '{}'", row.id),
            ));
        }
        let amount = parse_amount(&row.amount).map_err(|m| parse_failure(path, &record, m))?;
        let date = parse_transaction_time(&row.transaction_time)
            .map_err(|m| parse_failure(path, &record, m))?;

        if !window.contains(date) {
            skipped += 1;
            continue;
        }
        records.push(LedgerRecord::new(row.id, amount, row.kind, date));
    }

    debug!(path = %path.display(), kept = records.len(), skipped, "parsed ledger rows");
    Ok(records)
}

/// Parse bank statement CSV data, tagging every record with `origin`
pub fn parse_statements<R: Read>(
    input: R,
    path: &Path,
    origin: &str,
    window: &DateWindow,
) -> Result<Vec<StatementRecord>, LoadError> {
    let mut reader = csv_reader(input);
    let mut record = csv::StringRecord::new();
    let mut records = Vec::new();
    let mut skipped = 0usize;

    while read_row(&mut reader, &mut record, path)? {
        let row: StatementRow = record
            .deserialize(None)
            .map_err(|e| parse_failure(path, &record, e.to_string()))?;
        require_id(&row.id).map_err(|m| parse_failure(path, &record, m))?;
        let amount = parse_amount(&row.amount).map_err(|m| parse_failure(path, &record, m))?;
        let date = parse_date(&row.date).map_err(|m| parse_failure(path, &record, m))?;

        if !window.contains(date) {
            skipped += 1;
            continue;
        }
        records.push(StatementRecord::new(row.id, amount, date, origin));
    }

    debug!(path = %path.display(), kept = records.len(), skipped, "parsed statement rows");
    Ok(records)
}

/// Read a ledger CSV file
pub fn read_ledger_file(path: &Path, window: &DateWindow) -> Result<Vec<LedgerRecord>, LoadError> {
    parse_ledger(open(path)?, path, window)
}

/// Read a bank statement CSV file
pub fn read_statement_file(
    path: &Path,
    origin: &str,
    window: &DateWindow,
) -> Result<Vec<StatementRecord>, LoadError> {
    parse_statements(open(path)?, path, origin, window)
}

/// Ledger loaded from a CSV file
#[derive(Debug, Clone)]
pub struct CsvLedgerFile {
    path: PathBuf,
}

impl CsvLedgerFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File the ledger is read from
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LedgerSource for CsvLedgerFile {
    async fn load_ledger(&self, window: DateWindow) -> ReconciliationResult<Vec<LedgerRecord>> {
        let path = self.path.clone();
        let records = tokio::task::spawn_blocking(move || read_ledger_file(&path, &window))
            .await
            .map_err(|e| ReconciliationError::Task(e.to_string()))??;

        info!(path = %self.path.display(), records = records.len(), "loaded ledger");
        Ok(records)
    }
}

/// Bank statement feed loaded from a CSV file
///
/// The origin defaults to the file path as given.
#[derive(Debug, Clone)]
pub struct CsvStatementFile {
    path: PathBuf,
    origin: String,
}

impl CsvStatementFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let origin = path.display().to_string();
        Self { path, origin }
    }

    /// Use a custom origin label instead of the path
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// File the feed is read from
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StatementSource for CsvStatementFile {
    fn origin(&self) -> &str {
        &self.origin
    }

    async fn load_statements(
        &self,
        window: DateWindow,
    ) -> ReconciliationResult<Vec<StatementRecord>> {
        let path = self.path.clone();
        let origin = self.origin.clone();
        let records =
            tokio::task::spawn_blocking(move || read_statement_file(&path, &origin, &window))
                .await
                .map_err(|e| ReconciliationError::Task(e.to_string()))??;

        info!(origin = %self.origin, records = records.len(), "loaded statements");
        Ok(records)
    }
}
