//! Matching strategies

use crate::reconciliation::amount_difference;
use crate::traits::MatchStrategy;
use crate::types::*;

/// Greedy first-fit: the first eligible statement in input order wins.
///
/// No backtracking, so a closer amount later in the scan is ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FirstFit;

impl MatchStrategy for FirstFit {
    fn choose<'a, I>(&self, _record: &LedgerRecord, mut candidates: I) -> Option<usize>
    where
        I: Iterator<Item = (usize, &'a StatementRecord)>,
    {
        candidates.next().map(|(index, _)| index)
    }
}

/// Best-fit: the eligible statement with the smallest amount difference wins,
/// ties going to the earliest one in input order.
///
/// Still greedy per ledger record, not a globally optimal assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BestFit;

impl MatchStrategy for BestFit {
    fn choose<'a, I>(&self, record: &LedgerRecord, candidates: I) -> Option<usize>
    where
        I: Iterator<Item = (usize, &'a StatementRecord)>,
    {
        candidates
            .min_by_key(|(_, statement)| amount_difference(&record.amount, &statement.amount))
            .map(|(index, _)| index)
    }
}
