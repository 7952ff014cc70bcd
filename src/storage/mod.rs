//! Relational store access.
//!
//! [`ProposalStore`] is the seam the aggregator reads through; every method
//! reports failure explicitly and leaves the decision to downgrade it to the
//! caller. [`SqliteStorage`] is the `SQLite` implementation.

pub mod fixtures;
pub mod schema;
mod sqlite;

pub use sqlite::SqliteStorage;

use crate::core::{ConstraintRecord, OrderRecord};
use crate::error::StorageError;

/// Read-only access to enriched-proposal records.
pub trait ProposalStore {
    /// Constraints evaluated as violated for the proposal.
    fn violated_constraints(
        &self,
        proposal_id: i64,
    ) -> Result<Vec<ConstraintRecord>, StorageError>;

    /// All suggested orders for the proposal.
    fn orders(&self, proposal_id: i64) -> Result<Vec<OrderRecord>, StorageError>;

    /// Distinct proposal ids with at least one evaluated constraint.
    fn proposal_ids(&self) -> Result<Vec<i64>, StorageError>;
}
