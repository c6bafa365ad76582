//! Reconciliation service that loads every feed and runs the reconciler

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::{ReconciliationConfig, StrategyKind};
use crate::loader::{CsvLedgerFile, CsvStatementFile};
use crate::reconciliation::{BestFit, FirstFit, Reconciler, ReconciliationReport};
use crate::traits::*;
use crate::types::*;

/// Load every statement feed in parallel and merge them
///
/// Feeds are merged in the order given, each keeping its own record order,
/// whatever order the loads complete in. The first failing feed aborts the
/// whole load; the remaining tasks are cancelled.
pub async fn load_statement_feeds(
    feeds: &[Arc<dyn StatementSource>],
    window: DateWindow,
) -> ReconciliationResult<Vec<StatementRecord>> {
    let mut tasks = JoinSet::new();
    for (position, feed) in feeds.iter().enumerate() {
        let feed = Arc::clone(feed);
        tasks.spawn(async move { (position, feed.load_statements(window).await) });
    }

    let mut per_feed: Vec<Option<Vec<StatementRecord>>> = vec![None; feeds.len()];
    while let Some(joined) = tasks.join_next().await {
        let (position, loaded) = joined.map_err(|e| ReconciliationError::Task(e.to_string()))?;
        let records = loaded.inspect_err(|e| {
            warn!(origin = %feeds[position].origin(), error = %e, "statement feed failed");
        })?;
        debug!(origin = %feeds[position].origin(), records = records.len(), "feed loaded");
        per_feed[position] = Some(records);
    }

    Ok(per_feed.into_iter().flatten().flatten().collect())
}

/// Loads a ledger and its statement feeds, then reconciles them
pub struct ReconciliationService<M: MatchStrategy = FirstFit> {
    reconciler: Reconciler<M>,
}

impl ReconciliationService<FirstFit> {
    /// Create a service using the default first-fit reconciler
    pub fn new() -> Self {
        Self::with_reconciler(Reconciler::new())
    }
}

impl Default for ReconciliationService<FirstFit> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: MatchStrategy> ReconciliationService<M> {
    /// Create a service around a custom reconciler
    pub fn with_reconciler(reconciler: Reconciler<M>) -> Self {
        Self { reconciler }
    }

    /// Load the ledger and all feeds, then reconcile
    ///
    /// Any loader failure aborts the run before matching starts.
    pub async fn run(
        &self,
        ledger: &dyn LedgerSource,
        feeds: &[Arc<dyn StatementSource>],
        window: DateWindow,
    ) -> ReconciliationResult<ReconciliationReport> {
        info!(
            start = %window.start,
            end = %window.end,
            feeds = feeds.len(),
            "starting reconciliation run"
        );

        let (ledger_records, statement_records) = tokio::try_join!(
            ledger.load_ledger(window),
            load_statement_feeds(feeds, window)
        )?;

        self.reconciler.reconcile(&ledger_records, &statement_records)
    }
}

/// Run a reconciliation described by a configuration, reading CSV files
pub async fn reconcile_files(
    config: &ReconciliationConfig,
) -> ReconciliationResult<ReconciliationReport> {
    config.validate()?;
    let window = config.window()?;

    let ledger = CsvLedgerFile::new(&config.ledger_file);
    let feeds: Vec<Arc<dyn StatementSource>> = config
        .statement_files
        .iter()
        .map(|path| Arc::new(CsvStatementFile::new(path)) as Arc<dyn StatementSource>)
        .collect();

    let tolerances = config.tolerances.clone();
    let index = config.candidate_index();
    match config.strategy {
        StrategyKind::FirstFit => {
            let reconciler = Reconciler::with_strategy(FirstFit, tolerances).with_index(index);
            ReconciliationService::with_reconciler(reconciler)
                .run(&ledger, &feeds, window)
                .await
        }
        StrategyKind::BestFit => {
            let reconciler = Reconciler::with_strategy(BestFit, tolerances).with_index(index);
            ReconciliationService::with_reconciler(reconciler)
                .run(&ledger, &feeds, window)
                .await
        }
    }
}
