//! Reconcile a small ledger against two in-memory bank feeds

use std::str::FromStr;
use std::sync::Arc;

use bank_reconciliation::utils::{MemoryLedger, MemoryStatementFeed};
use bank_reconciliation::{
    BestFit, DateWindow, LedgerRecord, Reconciler, ReconciliationService, StatementSource,
    Tolerances,
};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;

fn amount(value: &str) -> BigDecimal {
    BigDecimal::from_str(value).expect("valid amount")
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, d).expect("valid date")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("🧾 Bank Reconciliation - Multi-feed Example\n");

    let ledger = MemoryLedger::new(vec![
        LedgerRecord::debit("TXN001", amount("1500.50"), day(8)),
        LedgerRecord::credit("TXN002", amount("250.75"), day(10)),
        LedgerRecord::credit("TXN003", amount("100.00"), day(8)),
        LedgerRecord::debit("TXN004", amount("42.00"), day(9)),
    ]);

    let feeds: Vec<Arc<dyn StatementSource>> = vec![
        Arc::new(
            MemoryStatementFeed::new("bank_A")
                .with_record("BS001", amount("1500.20"), day(8))
                .with_record("BS002", amount("250.75"), day(10)),
        ),
        Arc::new(
            MemoryStatementFeed::new("bank_B")
                .with_record("BB001", amount("42.40"), day(9))
                .with_record("BB002", amount("42.00"), day(9))
                .with_record("BB003", amount("105.00"), day(8)),
        ),
    ];

    let window = DateWindow::new(day(1), day(10))?;

    println!("📊 First-fit matching");
    let report = ReconciliationService::new()
        .run(&ledger, &feeds, window)
        .await?;
    println!("{}\n", report);

    println!("📊 Best-fit matching");
    let reconciler = Reconciler::with_strategy(BestFit, Tolerances::default());
    let report = ReconciliationService::with_reconciler(reconciler)
        .run(&ledger, &feeds, window)
        .await?;
    println!("{}\n", report);

    println!("📄 JSON report");
    println!("{}", report.to_json_pretty()?);

    Ok(())
}
