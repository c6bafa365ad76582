//! Reconciliation engine for system ledgers and bank statement feeds
//!
//! Pairs ledger records with statement records 1:1, sums the amount
//! differences that fall in the discrepancy band and groups whatever is left
//! over by feed. Matching is greedy and order dependent: ledger records are
//! processed in input order and each takes a partner chosen by the
//! configured [`MatchStrategy`] among the statements not yet consumed.

pub mod report;
pub mod strategy;

pub use report::*;
pub use strategy::*;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

use crate::traits::MatchStrategy;
use crate::types::*;
use crate::utils::validation::{validate_ledger_records, validate_statement_records};

/// Absolute difference between two amounts
pub fn amount_difference(a: &BigDecimal, b: &BigDecimal) -> BigDecimal {
    (a - b).abs()
}

/// Amount thresholds used for matching and discrepancy reporting
///
/// The match epsilon and the discrepancy band are independent. With the
/// defaults the upper band limit never binds, since any match already has a
/// difference below 0.50.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tolerances {
    /// A pair is a candidate only if its difference is strictly below this
    pub match_epsilon: BigDecimal,
    /// Exclusive lower limit of the discrepancy band
    pub discrepancy_min: BigDecimal,
    /// Exclusive upper limit of the discrepancy band
    pub discrepancy_max: BigDecimal,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            match_epsilon: BigDecimal::new(50.into(), 2),
            discrepancy_min: BigDecimal::new(1.into(), 2),
            discrepancy_max: BigDecimal::from(5),
        }
    }
}

impl Tolerances {
    /// Whether a difference is small enough for the pair to be matched
    pub fn within_match(&self, difference: &BigDecimal) -> bool {
        difference < &self.match_epsilon
    }

    /// Whether a matched difference counts towards the discrepancy total
    pub fn is_discrepant(&self, difference: &BigDecimal) -> bool {
        difference > &self.discrepancy_min && difference < &self.discrepancy_max
    }
}

/// How statement candidates are enumerated for each ledger record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateIndex {
    /// Scan every statement for every ledger record
    #[default]
    FullScan,
    /// Pre-bucket statements by date and scan only the same-day bucket.
    /// Bucket order follows input order and matching never crosses dates,
    /// so results equal a full scan for every strategy.
    ByDate,
}

/// Result of matching one ledger record
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    /// Paired with the statement at `statement_index`
    Matched {
        statement_index: usize,
        difference: BigDecimal,
    },
    /// No eligible statement was left
    Unmatched,
}

/// Statement positions to scan, in input order
enum Candidates {
    All(Vec<usize>),
    ByDate(HashMap<NaiveDate, Vec<usize>>),
}

impl Candidates {
    fn build(index: CandidateIndex, statements: &[StatementRecord]) -> Self {
        match index {
            CandidateIndex::FullScan => Candidates::All((0..statements.len()).collect()),
            CandidateIndex::ByDate => {
                let mut buckets: HashMap<NaiveDate, Vec<usize>> = HashMap::new();
                for (position, statement) in statements.iter().enumerate() {
                    buckets.entry(statement.date).or_default().push(position);
                }
                Candidates::ByDate(buckets)
            }
        }
    }

    fn positions(&self, date: NaiveDate) -> &[usize] {
        match self {
            Candidates::All(all) => all.as_slice(),
            Candidates::ByDate(buckets) => buckets.get(&date).map(Vec::as_slice).unwrap_or(&[]),
        }
    }
}

/// Reconciler pairing ledger records with statement records
///
/// Holds no state between calls; one instance can serve concurrent callers
/// as long as each passes its own inputs.
#[derive(Debug, Clone)]
pub struct Reconciler<M: MatchStrategy = FirstFit> {
    strategy: M,
    tolerances: Tolerances,
    index: CandidateIndex,
}

impl Reconciler<FirstFit> {
    /// Create a first-fit reconciler with default tolerances
    pub fn new() -> Self {
        Self::with_strategy(FirstFit, Tolerances::default())
    }
}

impl Default for Reconciler<FirstFit> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: MatchStrategy> Reconciler<M> {
    /// Create a reconciler with a custom strategy and tolerances
    pub fn with_strategy(strategy: M, tolerances: Tolerances) -> Self {
        Self {
            strategy,
            tolerances,
            index: CandidateIndex::FullScan,
        }
    }

    /// Use the given candidate enumeration
    pub fn with_index(mut self, index: CandidateIndex) -> Self {
        self.index = index;
        self
    }

    /// Reconcile ledger records against statement records
    ///
    /// Inputs are validated first (non-empty ids and origins, unique ledger
    /// ids); after that the pass cannot fail.
    #[instrument(
        name = "reconcile",
        skip_all,
        fields(ledger = ledger.len(), statements = statements.len())
    )]
    pub fn reconcile(
        &self,
        ledger: &[LedgerRecord],
        statements: &[StatementRecord],
    ) -> ReconciliationResult<ReconciliationReport> {
        validate_ledger_records(ledger)?;
        validate_statement_records(statements)?;

        let outcomes = self.match_records(ledger, statements);
        let report =
            ReconciliationReport::assemble(ledger, statements, &outcomes, &self.tolerances);

        info!(
            matched = report.total_matched_transactions,
            unmatched_ledger = report.unmatched_ledger.count,
            unmatched_statements = report.unmatched_statement_count(),
            discrepancies = %report.total_discrepancies_amount,
            "reconciliation finished"
        );
        Ok(report)
    }

    /// Match every ledger record, returning one outcome per record in input order
    ///
    /// Only unconsumed statements dated the same day as the ledger record are
    /// offered to the strategy. A position returned by `choose` that was not
    /// offered is ignored and the record stays unmatched.
    pub fn match_records(
        &self,
        ledger: &[LedgerRecord],
        statements: &[StatementRecord],
    ) -> Vec<MatchOutcome> {
        let candidates = Candidates::build(self.index, statements);
        let mut consumed = vec![false; statements.len()];
        let mut outcomes = Vec::with_capacity(ledger.len());

        for record in ledger {
            // Same-day statements only; strategies filter further
            let eligible: Vec<usize> = candidates
                .positions(record.date)
                .iter()
                .copied()
                .filter(|&position| !consumed[position])
                .filter(|&position| statements[position].date == record.date)
                .filter(|&position| {
                    self.strategy
                        .is_candidate(record, &statements[position], &self.tolerances)
                })
                .collect();

            let chosen = self
                .strategy
                .choose(
                    record,
                    eligible
                        .iter()
                        .map(|&position| (position, &statements[position])),
                )
                .filter(|position| {
                    let offered = eligible.contains(position);
                    if !offered {
                        warn!(
                            ledger_id = %record.id,
                            position,
                            "strategy chose a statement that was not offered"
                        );
                    }
                    offered
                });

            match chosen {
                Some(position) => {
                    consumed[position] = true;
                    let statement = &statements[position];
                    let difference = amount_difference(&record.amount, &statement.amount);
                    debug!(
                        ledger_id = %record.id,
                        statement_id = %statement.id,
                        %difference,
                        "matched"
                    );
                    outcomes.push(MatchOutcome::Matched {
                        statement_index: position,
                        difference,
                    });
                }
                None => {
                    debug!(ledger_id = %record.id, "no statement match");
                    outcomes.push(MatchOutcome::Unmatched);
                }
            }
        }

        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::str::FromStr;

    fn amount(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fixture() -> (Vec<LedgerRecord>, Vec<StatementRecord>) {
        let ledger = vec![
            LedgerRecord::debit("TXN001", amount("1500.50"), date(2025, 7, 8)),
            LedgerRecord::credit("TXN002", amount("250.75"), date(2025, 7, 10)),
            LedgerRecord::credit("TXN003", amount("100.00"), date(2025, 7, 8)),
        ];
        let statements = vec![
            StatementRecord::new("BS001", amount("1500.20"), date(2025, 7, 8), "bank_A.csv"),
            StatementRecord::new("BS002", amount("250.75"), date(2025, 7, 10), "bank_A.csv"),
            StatementRecord::new("BS003", amount("105.00"), date(2025, 7, 8), "bank_A.csv"),
        ];
        (ledger, statements)
    }

    fn assert_conservation(
        report: &ReconciliationReport,
        ledger: &[LedgerRecord],
        statements: &[StatementRecord],
    ) {
        assert_eq!(
            report.total_matched_transactions * 2
                + report.unmatched_ledger.count
                + report.unmatched_statement_count(),
            ledger.len() + statements.len()
        );
        assert_eq!(report.total_transactions, ledger.len() + statements.len());
    }

    #[test]
    fn test_fixture_scenario() {
        let (ledger, statements) = fixture();
        let report = Reconciler::new().reconcile(&ledger, &statements).unwrap();

        assert_eq!(report.total_transactions, 6);
        assert_eq!(report.total_matched_transactions, 2);
        assert_eq!(report.unmatched_ledger.count, 1);
        assert_eq!(report.unmatched_ledger.records[0].id, "TXN003");
        assert_eq!(report.unmatched_statements["bank_A.csv"].count, 1);
        assert_eq!(report.unmatched_statements["bank_A.csv"].records[0].id, "BS003");
        assert_eq!(report.total_discrepancies_amount, amount("0.30"));
        assert_eq!(report.discrepant_transactions, 1);
        assert_conservation(&report, &ledger, &statements);
    }

    #[test]
    fn test_first_eligible_statement_wins() {
        let ledger = vec![LedgerRecord::debit("TX1", amount("100.00"), date(2025, 7, 8))];
        let statements = vec![
            StatementRecord::new("FAR", amount("100.40"), date(2025, 7, 8), "bank_A.csv"),
            StatementRecord::new("EXACT", amount("100.00"), date(2025, 7, 8), "bank_A.csv"),
        ];

        let report = Reconciler::new().reconcile(&ledger, &statements).unwrap();
        assert_eq!(report.matched_pairs[0].statement_id, "FAR");
        assert_eq!(report.unmatched_statements["bank_A.csv"].records[0].id, "EXACT");

        // Reordering the statements changes the partner
        let reversed: Vec<_> = statements.iter().rev().cloned().collect();
        let report = Reconciler::new().reconcile(&ledger, &reversed).unwrap();
        assert_eq!(report.matched_pairs[0].statement_id, "EXACT");
        assert_eq!(report.unmatched_statements["bank_A.csv"].records[0].id, "FAR");
    }

    #[test]
    fn test_no_statement_reused() {
        let ledger = vec![
            LedgerRecord::debit("TX1", amount("10.00"), date(2025, 7, 8)),
            LedgerRecord::debit("TX2", amount("10.00"), date(2025, 7, 8)),
            LedgerRecord::debit("TX3", amount("10.00"), date(2025, 7, 8)),
        ];
        let statements = vec![
            StatementRecord::new("BS1", amount("10.00"), date(2025, 7, 8), "bank_A.csv"),
            StatementRecord::new("BS2", amount("10.10"), date(2025, 7, 8), "bank_B.csv"),
        ];

        let report = Reconciler::new().reconcile(&ledger, &statements).unwrap();
        assert_eq!(report.total_matched_transactions, 2);

        let partners: HashSet<_> = report
            .matched_pairs
            .iter()
            .map(|pair| pair.statement_id.clone())
            .collect();
        assert_eq!(partners.len(), report.matched_pairs.len());
        assert!(report.unmatched_statements.is_empty());
        assert_eq!(report.unmatched_ledger.records[0].id, "TX3");
        assert_conservation(&report, &ledger, &statements);
    }

    #[test]
    fn test_discrepancy_banding() {
        let day = date(2025, 7, 8);
        let ledger = vec![
            LedgerRecord::debit("EXACT", amount("10.00"), day),
            LedgerRecord::debit("BAND", amount("20.00"), day),
            LedgerRecord::debit("TINY", amount("30.000"), day),
        ];
        let statements = vec![
            StatementRecord::new("S1", amount("10.00"), day, "bank_A.csv"),
            StatementRecord::new("S2", amount("20.30"), day, "bank_A.csv"),
            StatementRecord::new("S3", amount("30.005"), day, "bank_A.csv"),
        ];

        let report = Reconciler::new().reconcile(&ledger, &statements).unwrap();
        assert_eq!(report.total_matched_transactions, 3);
        assert_eq!(report.total_discrepancies_amount, amount("0.30"));
        assert_eq!(report.discrepant_transactions, 1);

        let discrepant: Vec<_> = report
            .matched_pairs
            .iter()
            .map(|pair| (pair.ledger_id.as_str(), pair.discrepant))
            .collect();
        assert_eq!(
            discrepant,
            vec![("EXACT", false), ("BAND", true), ("TINY", false)]
        );
    }

    #[test]
    fn test_discrepancy_lower_bound_is_exclusive() {
        let day = date(2025, 7, 8);
        let ledger = vec![LedgerRecord::debit("TX1", amount("10.00"), day)];
        let statements = vec![StatementRecord::new("S1", amount("10.01"), day, "a")];

        let report = Reconciler::new().reconcile(&ledger, &statements).unwrap();
        assert_eq!(report.total_matched_transactions, 1);
        assert_eq!(report.total_discrepancies_amount, BigDecimal::from(0));
    }

    #[test]
    fn test_independent_tolerances_activate_upper_band() {
        let day = date(2025, 7, 8);
        let tolerances = Tolerances {
            match_epsilon: BigDecimal::from(10),
            ..Tolerances::default()
        };
        let ledger = vec![
            LedgerRecord::debit("TX1", amount("100.00"), day),
            LedgerRecord::debit("TX2", amount("200.00"), day),
        ];
        let statements = vec![
            StatementRecord::new("S1", amount("104.00"), day, "a"),
            StatementRecord::new("S2", amount("205.00"), day, "a"),
        ];

        let report = Reconciler::with_strategy(FirstFit, tolerances)
            .reconcile(&ledger, &statements)
            .unwrap();
        assert_eq!(report.total_matched_transactions, 2);
        // 5.00 sits on the exclusive upper limit
        assert_eq!(report.total_discrepancies_amount, amount("4.00"));
    }

    #[test]
    fn test_unmatched_statements_grouped_by_origin() {
        let day = date(2025, 7, 8);
        let ledger = vec![LedgerRecord::debit("TX1", amount("1.00"), day)];
        let statements = vec![
            StatementRecord::new("A1", amount("50.00"), day, "bank_A.csv"),
            StatementRecord::new("B1", amount("60.00"), day, "bank_B.csv"),
            StatementRecord::new("A2", amount("70.00"), day, "bank_A.csv"),
        ];

        let report = Reconciler::new().reconcile(&ledger, &statements).unwrap();
        assert_eq!(report.unmatched_statements.len(), 2);

        let bank_a = &report.unmatched_statements["bank_A.csv"];
        assert_eq!(bank_a.count, 2);
        let ids: Vec<_> = bank_a.records.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["A1", "A2"]);
        assert_eq!(report.unmatched_statements["bank_B.csv"].count, 1);
        assert_conservation(&report, &ledger, &statements);
    }

    #[test]
    fn test_empty_inputs() {
        let report = Reconciler::new().reconcile(&[], &[]).unwrap();
        assert_eq!(report.total_transactions, 0);
        assert_eq!(report.total_matched_transactions, 0);
        assert!(report.unmatched_ledger.records.is_empty());
        assert!(report.unmatched_statements.is_empty());
        assert_eq!(report.total_discrepancies_amount, BigDecimal::from(0));
    }

    #[test]
    fn test_reconcile_is_deterministic() {
        let (ledger, statements) = fixture();
        let reconciler = Reconciler::new();
        let first = reconciler.reconcile(&ledger, &statements).unwrap();
        let second = reconciler.reconcile(&ledger, &statements).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_date_index_matches_full_scan() {
        let ledger = vec![
            LedgerRecord::debit("TX1", amount("10.00"), date(2025, 7, 8)),
            LedgerRecord::debit("TX2", amount("10.00"), date(2025, 7, 9)),
            LedgerRecord::debit("TX3", amount("10.20"), date(2025, 7, 8)),
            LedgerRecord::debit("TX4", amount("99.00"), date(2025, 7, 8)),
        ];
        let statements = vec![
            StatementRecord::new("S1", amount("10.30"), date(2025, 7, 9), "a"),
            StatementRecord::new("S2", amount("10.10"), date(2025, 7, 8), "a"),
            StatementRecord::new("S3", amount("10.00"), date(2025, 7, 8), "b"),
            StatementRecord::new("S4", amount("42.00"), date(2025, 7, 10), "b"),
        ];

        assert_index_parity(&ledger, &statements);
    }

    fn assert_index_parity(ledger: &[LedgerRecord], statements: &[StatementRecord]) {
        let full = Reconciler::new().reconcile(ledger, statements).unwrap();
        let indexed = Reconciler::new()
            .with_index(CandidateIndex::ByDate)
            .reconcile(ledger, statements)
            .unwrap();
        assert_eq!(full, indexed);

        let best_full = Reconciler::with_strategy(BestFit, Tolerances::default())
            .reconcile(ledger, statements)
            .unwrap();
        let best_indexed = Reconciler::with_strategy(BestFit, Tolerances::default())
            .with_index(CandidateIndex::ByDate)
            .reconcile(ledger, statements)
            .unwrap();
        assert_eq!(best_full, best_indexed);
    }

    #[test]
    fn test_best_fit_prefers_closest_amount() {
        let day = date(2025, 7, 8);
        let ledger = vec![LedgerRecord::debit("TX1", amount("100.00"), day)];
        let statements = vec![
            StatementRecord::new("FAR", amount("100.40"), day, "a"),
            StatementRecord::new("EXACT", amount("100.00"), day, "a"),
        ];

        let report = Reconciler::with_strategy(BestFit, Tolerances::default())
            .reconcile(&ledger, &statements)
            .unwrap();
        assert_eq!(report.matched_pairs[0].statement_id, "EXACT");
        assert_eq!(report.total_discrepancies_amount, BigDecimal::from(0));
    }

    #[test]
    fn test_match_outcomes_follow_ledger_order() {
        let (ledger, statements) = fixture();
        let outcomes = Reconciler::new().match_records(&ledger, &statements);
        assert_eq!(
            outcomes,
            vec![
                MatchOutcome::Matched {
                    statement_index: 0,
                    difference: amount("0.30"),
                },
                MatchOutcome::Matched {
                    statement_index: 1,
                    difference: BigDecimal::from(0),
                },
                MatchOutcome::Unmatched,
            ]
        );
    }

    #[test]
    fn test_duplicate_ledger_ids_rejected() {
        let day = date(2025, 7, 8);
        let ledger = vec![
            LedgerRecord::debit("TX1", amount("1.00"), day),
            LedgerRecord::credit("TX1", amount("2.00"), day),
        ];
        let result = Reconciler::new().reconcile(&ledger, &[]);
        assert!(matches!(result, Err(ReconciliationError::Validation(_))));
    }

    /// Accepts any pair regardless of amount
    struct AnyAmount;

    impl MatchStrategy for AnyAmount {
        fn is_candidate(&self, _: &LedgerRecord, _: &StatementRecord, _: &Tolerances) -> bool {
            true
        }

        fn choose<'a, I>(&self, _record: &LedgerRecord, mut candidates: I) -> Option<usize>
        where
            I: Iterator<Item = (usize, &'a StatementRecord)>,
        {
            candidates.next().map(|(position, _)| position)
        }
    }

    /// Always answers with a fixed position
    struct FixedPosition(usize);

    impl MatchStrategy for FixedPosition {
        fn choose<'a, I>(&self, _record: &LedgerRecord, _candidates: I) -> Option<usize>
        where
            I: Iterator<Item = (usize, &'a StatementRecord)>,
        {
            Some(self.0)
        }
    }

    #[test]
    fn test_matching_never_crosses_dates() {
        let ledger = vec![LedgerRecord::debit("T1", amount("10.00"), date(2025, 7, 8))];
        let statements = vec![StatementRecord::new(
            "S1",
            amount("10.00"),
            date(2025, 7, 9),
            "a",
        )];

        let full = Reconciler::with_strategy(AnyAmount, Tolerances::default())
            .reconcile(&ledger, &statements)
            .unwrap();
        let indexed = Reconciler::with_strategy(AnyAmount, Tolerances::default())
            .with_index(CandidateIndex::ByDate)
            .reconcile(&ledger, &statements)
            .unwrap();

        assert_eq!(full.total_matched_transactions, 0);
        assert_eq!(full, indexed);
    }

    #[test]
    fn test_custom_predicate_keeps_index_parity() {
        let day = date(2025, 7, 8);
        let ledger = vec![
            LedgerRecord::debit("T1", amount("10.00"), day),
            LedgerRecord::debit("T2", amount("50.00"), date(2025, 7, 9)),
        ];
        let statements = vec![
            StatementRecord::new("S1", amount("90.00"), date(2025, 7, 9), "a"),
            StatementRecord::new("S2", amount("70.00"), day, "a"),
        ];

        let full = Reconciler::with_strategy(AnyAmount, Tolerances::default())
            .reconcile(&ledger, &statements)
            .unwrap();
        let indexed = Reconciler::with_strategy(AnyAmount, Tolerances::default())
            .with_index(CandidateIndex::ByDate)
            .reconcile(&ledger, &statements)
            .unwrap();

        assert_eq!(full, indexed);
        let pairs: Vec<_> = full
            .matched_pairs
            .iter()
            .map(|p| (p.ledger_id.as_str(), p.statement_id.as_str()))
            .collect();
        assert_eq!(pairs, vec![("T1", "S2"), ("T2", "S1")]);
    }

    #[test]
    fn test_unoffered_choice_is_ignored() {
        let ledger = vec![
            LedgerRecord::debit("T1", amount("10.00"), date(2025, 7, 8)),
            LedgerRecord::debit("T2", amount("20.00"), date(2025, 7, 9)),
        ];
        let statements = vec![
            StatementRecord::new("S1", amount("10.00"), date(2025, 7, 8), "a"),
            StatementRecord::new("S2", amount("20.00"), date(2025, 7, 9), "a"),
        ];

        let report = Reconciler::with_strategy(FixedPosition(0), Tolerances::default())
            .reconcile(&ledger, &statements)
            .unwrap();

        // S1 is consumed by T1 and never offered to T2
        assert_eq!(report.total_matched_transactions, 1);
        assert_eq!(report.matched_pairs[0].statement_id, "S1");
        assert_eq!(report.unmatched_ledger.records[0].id, "T2");
        assert_eq!(report.unmatched_statements["a"].records[0].id, "S2");
        assert_conservation(&report, &ledger, &statements);
    }

    #[test]
    fn test_out_of_range_choice_is_ignored() {
        let (ledger, statements) = fixture();
        let report = Reconciler::with_strategy(FixedPosition(99), Tolerances::default())
            .reconcile(&ledger, &statements)
            .unwrap();

        assert_eq!(report.total_matched_transactions, 0);
        assert_eq!(report.unmatched_ledger.count, 3);
        assert_conservation(&report, &ledger, &statements);
    }
}
