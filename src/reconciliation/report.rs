//! Reconciliation report and result aggregation

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::reconciliation::{MatchOutcome, Tolerances};
use crate::types::*;

/// One ledger record paired with one statement record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedPair {
    pub ledger_id: String,
    pub statement_id: String,
    /// Feed the statement came from
    pub origin: String,
    pub date: NaiveDate,
    /// Absolute amount difference between the two records
    pub difference: BigDecimal,
    /// Whether the difference fell inside the discrepancy band
    pub discrepant: bool,
}

/// Ledger records with no statement counterpart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnmatchedLedger {
    #[serde(rename = "total_system_trans_missing_bank")]
    pub count: usize,
    #[serde(rename = "system_trans_missing_bank_list")]
    pub records: Vec<LedgerRecord>,
}

/// Statement records of one feed with no ledger counterpart
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnmatchedStatements {
    #[serde(rename = "this_bank_unmatched_trans_count")]
    pub count: usize,
    #[serde(rename = "this_bank_unmatched_trans_list")]
    pub records: Vec<StatementRecord>,
}

/// Summary of a reconciliation run
///
/// The unmatched sections serialize under the `sys_unmatched_transactions_detail`
/// and `bank_unmatched_transactions_detail` keys. Amounts serialize as decimal
/// strings so no precision is lost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    /// Ledger records plus statement records
    pub total_transactions: usize,
    /// Number of ledger/statement pairs
    pub total_matched_transactions: usize,
    /// Sum of the differences of discrepant pairs
    pub total_discrepancies_amount: BigDecimal,
    /// Number of discrepant pairs
    pub discrepant_transactions: usize,
    /// Pairs in ledger input order
    pub matched_pairs: Vec<MatchedPair>,
    #[serde(rename = "sys_unmatched_transactions_detail")]
    pub unmatched_ledger: UnmatchedLedger,
    /// Unmatched statements keyed by origin
    #[serde(rename = "bank_unmatched_transactions_detail")]
    pub unmatched_statements: BTreeMap<String, UnmatchedStatements>,
}

impl ReconciliationReport {
    /// Build the report from per-ledger-record outcomes
    pub(crate) fn assemble(
        ledger: &[LedgerRecord],
        statements: &[StatementRecord],
        outcomes: &[MatchOutcome],
        tolerances: &Tolerances,
    ) -> Self {
        let mut consumed = vec![false; statements.len()];
        let mut matched_pairs = Vec::new();
        let mut unmatched_ledger = UnmatchedLedger::default();
        let mut total_discrepancies_amount = BigDecimal::from(0);
        let mut discrepant_transactions = 0;

        for (record, outcome) in ledger.iter().zip(outcomes) {
            match outcome {
                MatchOutcome::Matched {
                    statement_index,
                    difference,
                } => {
                    let statement = &statements[*statement_index];
                    consumed[*statement_index] = true;

                    let discrepant = tolerances.is_discrepant(difference);
                    if discrepant {
                        total_discrepancies_amount += difference;
                        discrepant_transactions += 1;
                    }

                    matched_pairs.push(MatchedPair {
                        ledger_id: record.id.clone(),
                        statement_id: statement.id.clone(),
                        origin: statement.origin.clone(),
                        date: record.date,
                        difference: difference.clone(),
                        discrepant,
                    });
                }
                MatchOutcome::Unmatched => {
                    unmatched_ledger.count += 1;
                    unmatched_ledger.records.push(record.clone());
                }
            }
        }

        let mut unmatched_statements: BTreeMap<String, UnmatchedStatements> = BTreeMap::new();
        for (statement, _) in statements
            .iter()
            .zip(&consumed)
            .filter(|(_, used)| !**used)
        {
            let group = unmatched_statements
                .entry(statement.origin.clone())
                .or_default();
            group.count += 1;
            group.records.push(statement.clone());
        }

        Self {
            total_transactions: ledger.len() + statements.len(),
            total_matched_transactions: matched_pairs.len(),
            total_discrepancies_amount,
            discrepant_transactions,
            matched_pairs,
            unmatched_ledger,
            unmatched_statements,
        }
    }

    /// Unmatched statement records across all feeds
    pub fn unmatched_statement_count(&self) -> usize {
        self.unmatched_statements.values().map(|group| group.count).sum()
    }

    /// Whether every record found a partner
    pub fn is_fully_reconciled(&self) -> bool {
        self.unmatched_ledger.count == 0 && self.unmatched_statements.is_empty()
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json_pretty(&self) -> ReconciliationResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for ReconciliationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total transactions:      {}", self.total_transactions)?;
        writeln!(f, "Matched transactions:    {}", self.total_matched_transactions)?;
        writeln!(
            f,
            "Discrepancies:           {} ({} pairs)",
            self.total_discrepancies_amount, self.discrepant_transactions
        )?;
        writeln!(f, "Unmatched ledger:        {}", self.unmatched_ledger.count)?;
        for record in &self.unmatched_ledger.records {
            writeln!(
                f,
                "  {} {} {:?} {}",
                record.id, record.amount, record.kind, record.date
            )?;
        }
        write!(f, "Unmatched statements:    {}", self.unmatched_statement_count())?;
        for (origin, group) in &self.unmatched_statements {
            write!(f, "\n  {} ({})", origin, group.count)?;
            for record in &group.records {
                write!(f, "\n    {} {} {}", record.id, record.amount, record.date)?;
            }
        }
        Ok(())
    }
}
