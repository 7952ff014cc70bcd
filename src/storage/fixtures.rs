//! Sample data for demos and tests.
//!
//! Proposal 557: one violated equity-band constraint and two buy orders.

use rusqlite::params;

use super::SqliteStorage;
use crate::error::StorageError;

/// Proposal id of the bundled sample.
pub const SAMPLE_PROPOSAL_ID: i64 = 557;

/// `(name, violated)` for the sample constraints.
const SAMPLE_CONSTRAINTS: [(&str, bool); 1] = [("32% < Equity < 50%", true)];

/// `(transaction_type, quantity, price_value, target_quantity)` for the sample orders.
const SAMPLE_ORDERS: [(&str, i64, f64, i64); 2] =
    [("BUY", 50, 244.05, 150), ("BUY", 370, 84.62, 650)];

/// Inserts the sample proposal in one transaction.
///
/// Returns the number of rows written.
///
/// # Errors
///
/// Returns [`StorageError::Sqlite`] if the tables are missing or an insert
/// fails; nothing is written in that case.
pub fn seed_sample(storage: &mut SqliteStorage) -> Result<usize, StorageError> {
    let tx = storage.connection_mut().transaction()?;
    let mut written = 0;

    for (name, violated) in SAMPLE_CONSTRAINTS {
        written += tx.execute(
            "INSERT INTO enriched_proposal_evaluated_constraints \
             (enriched_proposal_id, name, violated) VALUES (?1, ?2, ?3)",
            params![SAMPLE_PROPOSAL_ID, name, violated],
        )?;
    }

    for (transaction_type, quantity, price_value, target_quantity) in SAMPLE_ORDERS {
        written += tx.execute(
            "INSERT INTO enriched_proposals_orders \
             (enriched_proposals_id, transaction_type, quantity, price_value, target_quantity) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                SAMPLE_PROPOSAL_ID,
                transaction_type,
                quantity,
                price_value,
                target_quantity
            ],
        )?;
    }

    tx.commit()?;
    Ok(written)
}
