//! Traits for record sources and pluggable matching policies

use async_trait::async_trait;

use crate::reconciliation::{amount_difference, Tolerances};
use crate::types::*;

/// Source of system ledger records
///
/// Implementations are expected to return records already restricted to the
/// given window, in their natural (file) order. The reconciler is order
/// sensitive, so sources must not reorder records.
#[async_trait]
pub trait LedgerSource: Send + Sync {
    /// Load every ledger record dated inside the window
    async fn load_ledger(&self, window: DateWindow) -> ReconciliationResult<Vec<LedgerRecord>>;
}

/// Source of bank statement records for a single feed
#[async_trait]
pub trait StatementSource: Send + Sync {
    /// Identifier of the feed, copied into every record it produces
    fn origin(&self) -> &str;

    /// Load every statement record dated inside the window
    async fn load_statements(
        &self,
        window: DateWindow,
    ) -> ReconciliationResult<Vec<StatementRecord>>;
}

/// Pairing policy used by the reconciler
///
/// The reconciler only ever offers statements dated the same day as the
/// ledger record and not yet consumed. `is_candidate` narrows that set
/// further, `choose` picks one partner among what is left. A position that
/// was not offered is ignored by the reconciler.
pub trait MatchStrategy: Send + Sync {
    /// Absolute amount difference strictly below the match epsilon
    fn is_candidate(
        &self,
        record: &LedgerRecord,
        statement: &StatementRecord,
        tolerances: &Tolerances,
    ) -> bool {
        tolerances.within_match(&amount_difference(&record.amount, &statement.amount))
    }

    /// Pick a partner among `candidates`, given as `(statement index, statement)`
    /// in input order. Returns the chosen statement index.
    fn choose<'a, I>(&self, record: &LedgerRecord, candidates: I) -> Option<usize>
    where
        I: Iterator<Item = (usize, &'a StatementRecord)>;
}
