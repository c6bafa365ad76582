//! # Bank Reconciliation
//!
//! Reconciles a ledger of internal system transactions against one or more
//! bank statement feeds over a date window.
//!
//! ## Features
//!
//! - **Matching**: greedy 1:1 pairing on same date and amount within a tolerance
//! - **Discrepancies**: sum of the differences of matched pairs inside a reporting band
//! - **Unmatched records**: listed for the ledger and grouped per statement feed
//! - **Pluggable strategies**: first-fit by default, best-fit available
//! - **Loading**: CSV ledger and statement files, read in parallel and filtered to the window
//!
//! ## Quick Start
//!
//! ```rust
//! use bank_reconciliation::{LedgerRecord, Reconciler, StatementRecord};
//! use bigdecimal::BigDecimal;
//! use chrono::NaiveDate;
//! use std::str::FromStr;
//!
//! let day = NaiveDate::from_ymd_opt(2025, 7, 8).unwrap();
//! let ledger = vec![LedgerRecord::debit("TXN001", BigDecimal::from_str("1500.50").unwrap(), day)];
//! let statements = vec![StatementRecord::new(
//!     "BS001",
//!     BigDecimal::from_str("1500.20").unwrap(),
//!     day,
//!     "bank_A.csv",
//! )];
//!
//! let report = Reconciler::new().reconcile(&ledger, &statements).unwrap();
//! assert_eq!(report.total_matched_transactions, 1);
//! assert_eq!(report.total_discrepancies_amount, BigDecimal::from_str("0.30").unwrap());
//! ```

pub mod config;
pub mod loader;
pub mod reconciliation;
pub mod service;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::*;
pub use loader::*;
pub use reconciliation::*;
pub use service::*;
pub use traits::*;
pub use types::*;
