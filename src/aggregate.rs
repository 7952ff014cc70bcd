//! Proposal detail aggregation.
//!
//! Combines violated constraints and suggested orders for a proposal into a
//! [`ProposalDetails`] bundle. The two fetches are independent: under
//! [`FetchPolicy::BestEffort`] a failing fetch is logged, recorded in
//! [`ProposalDetails::fetch_errors`], and replaced by an empty list while the
//! other fetch proceeds. Under [`FetchPolicy::FailFast`] the first failure is
//! returned.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::config::FetchPolicy;
use crate::core::{ConstraintRecord, OrderRecord, ProposalDetails};
use crate::error::StorageError;
use crate::storage::ProposalStore;

/// Assembles proposal bundles from a [`ProposalStore`].
#[derive(Debug)]
pub struct ProposalAggregator<'a, S: ProposalStore + ?Sized> {
    store: &'a S,
    policy: FetchPolicy,
}

impl<'a, S: ProposalStore + ?Sized> ProposalAggregator<'a, S> {
    /// Creates an aggregator over `store` with the given failure policy.
    pub const fn new(store: &'a S, policy: FetchPolicy) -> Self {
        Self { store, policy }
    }

    /// Failure policy in effect.
    pub const fn policy(&self) -> FetchPolicy {
        self.policy
    }

    /// Violated constraints for the proposal.
    ///
    /// # Errors
    ///
    /// Returns the store's error unchanged; no policy is applied here.
    pub fn fetch_violated_constraints(
        &self,
        proposal_id: i64,
    ) -> Result<Vec<ConstraintRecord>, StorageError> {
        self.store.violated_constraints(proposal_id)
    }

    /// All orders for the proposal.
    ///
    /// # Errors
    ///
    /// Returns the store's error unchanged; no policy is applied here.
    pub fn fetch_orders(&self, proposal_id: i64) -> Result<Vec<OrderRecord>, StorageError> {
        self.store.orders(proposal_id)
    }

    /// Builds the bundle for one proposal.
    ///
    /// # Errors
    ///
    /// Never fails under [`FetchPolicy::BestEffort`]. Under
    /// [`FetchPolicy::FailFast`] returns the first fetch error.
    pub fn get_details(&self, proposal_id: i64) -> Result<ProposalDetails, StorageError> {
        let mut details = ProposalDetails::empty(proposal_id);

        match self.fetch_violated_constraints(proposal_id) {
            Ok(constraints) => details.constraints = constraints,
            Err(e) => self.downgrade("constraints", proposal_id, e, &mut details.fetch_errors)?,
        }

        match self.fetch_orders(proposal_id) {
            Ok(orders) => details.orders = orders,
            Err(e) => self.downgrade("orders", proposal_id, e, &mut details.fetch_errors)?,
        }

        debug!(
            proposal_id,
            constraints = details.constraints.len(),
            orders = details.orders.len(),
            degraded = details.is_degraded(),
            "assembled proposal details"
        );
        Ok(details)
    }

    /// Builds one bundle per distinct proposal id in the constraint table.
    ///
    /// Bundles are produced sequentially in ascending id order.
    ///
    /// # Errors
    ///
    /// Never fails under [`FetchPolicy::BestEffort`]; if id discovery fails
    /// the result is empty. Under [`FetchPolicy::FailFast`] returns the first
    /// error.
    pub fn get_details_for_all_proposals(&self) -> Result<Vec<ProposalDetails>, StorageError> {
        let ids = match self.store.proposal_ids() {
            Ok(ids) => ids,
            Err(e) => match self.policy {
                FetchPolicy::FailFast => return Err(e),
                FetchPolicy::BestEffort => {
                    warn!(error = %e, "failed to list proposal ids; returning no bundles");
                    return Ok(Vec::new());
                }
            },
        };

        let unique: BTreeSet<i64> = ids.into_iter().collect();
        debug!(proposals = unique.len(), "aggregating all proposals");
        unique.into_iter().map(|id| self.get_details(id)).collect()
    }

    fn downgrade(
        &self,
        what: &str,
        proposal_id: i64,
        error: StorageError,
        fetch_errors: &mut Vec<String>,
    ) -> Result<(), StorageError> {
        match self.policy {
            FetchPolicy::FailFast => Err(error),
            FetchPolicy::BestEffort => {
                warn!(proposal_id, what, error = %error, "fetch failed; continuing with empty list");
                fetch_errors.push(format!("{what}: {error}"));
                Ok(())
            }
        }
    }
}
