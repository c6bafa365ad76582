//! Validation utilities

use std::collections::HashSet;

use bigdecimal::BigDecimal;

use crate::reconciliation::Tolerances;
use crate::types::*;

/// Validate that a record ID is usable
pub fn validate_record_id(id: &str) -> ReconciliationResult<()> {
    if id.trim().is_empty() {
        return Err(ReconciliationError::Validation(
            "Record ID cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validate ledger records before reconciliation
///
/// IDs must be non-empty and unique within the run.
pub fn validate_ledger_records(records: &[LedgerRecord]) -> ReconciliationResult<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        validate_record_id(&record.id)?;
        if !seen.insert(record.id.as_str()) {
            return Err(ReconciliationError::Validation(format!(
                "Ledger record '{}' appears more than once",
                record.id
            )));
        }
    }

    Ok(())
}

/// Validate statement records before reconciliation
pub fn validate_statement_records(records: &[StatementRecord]) -> ReconciliationResult<()> {
    for record in records {
        validate_record_id(&record.id)?;
        if record.origin.trim().is_empty() {
            return Err(ReconciliationError::Validation(format!(
                "Statement record '{}' has no origin",
                record.id
            )));
        }
    }

    Ok(())
}

/// Validate that configured tolerances are usable
pub fn validate_tolerances(tolerances: &Tolerances) -> ReconciliationResult<()> {
    let zero = BigDecimal::from(0);

    if tolerances.match_epsilon <= zero {
        return Err(ReconciliationError::Config(
            "Match epsilon must be positive".to_string(),
        ));
    }

    if tolerances.discrepancy_min < zero || tolerances.discrepancy_max < zero {
        return Err(ReconciliationError::Config(
            "Discrepancy band limits cannot be negative".to_string(),
        ));
    }

    if tolerances.discrepancy_min >= tolerances.discrepancy_max {
        return Err(ReconciliationError::Config(format!(
            "Discrepancy band is empty: min = {}, max = {}",
            tolerances.discrepancy_min, tolerances.discrepancy_max
        )));
    }

    Ok(())
}
