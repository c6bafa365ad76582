//! In-memory record sources for testing

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use crate::traits::*;
use crate::types::*;

/// In-memory ledger source for testing and development
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    records: Vec<LedgerRecord>,
}

impl MemoryLedger {
    /// Create a ledger source holding the given records
    pub fn new(records: Vec<LedgerRecord>) -> Self {
        Self { records }
    }

    /// Append a record
    pub fn push(&mut self, record: LedgerRecord) {
        self.records.push(record);
    }
}

#[async_trait]
impl LedgerSource for MemoryLedger {
    async fn load_ledger(&self, window: DateWindow) -> ReconciliationResult<Vec<LedgerRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|record| window.contains(record.date))
            .cloned()
            .collect())
    }
}

/// In-memory statement feed for testing and development
///
/// Records pushed into the feed are tagged with the feed's origin.
#[derive(Debug, Clone)]
pub struct MemoryStatementFeed {
    origin: String,
    records: Vec<StatementRecord>,
}

impl MemoryStatementFeed {
    /// Create an empty feed
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            records: Vec::new(),
        }
    }

    /// Append a record to the feed
    pub fn with_record(
        mut self,
        id: impl Into<String>,
        amount: BigDecimal,
        date: NaiveDate,
    ) -> Self {
        let record = StatementRecord::new(id, amount, date, self.origin.clone());
        self.records.push(record);
        self
    }
}

#[async_trait]
impl StatementSource for MemoryStatementFeed {
    fn origin(&self) -> &str {
        &self.origin
    }

    async fn load_statements(
        &self,
        window: DateWindow,
    ) -> ReconciliationResult<Vec<StatementRecord>> {
        Ok(self
            .records
            .iter()
            .filter(|record| window.contains(record.date))
            .cloned()
            .collect())
    }
}
