//! # proposal-advisor
//!
//! Classifies free-text portfolio questions into a fixed set of query
//! intents with an OpenAI-compatible model, and assembles enriched
//! proposals (violated constraints plus suggested orders) from a `SQLite`
//! store so they can be inspected, exported, or explained to a client.
//!
//! ## Layout
//!
//! - [`core`]: intents, typed records, and row normalization
//! - [`storage`]: the [`storage::ProposalStore`] seam and its `SQLite` backend
//! - [`aggregate`]: per-proposal bundles under a configurable failure policy
//! - [`agent`]: the classifier and advisor agents and their LLM providers
//! - [`cli`]: the `proposal-advisor` command line
//!
//! ## Example
//!
//! ```no_run
//! use proposal_advisor::aggregate::ProposalAggregator;
//! use proposal_advisor::config::FetchPolicy;
//! use proposal_advisor::storage::SqliteStorage;
//!
//! # fn main() -> proposal_advisor::Result<()> {
//! let storage = SqliteStorage::open(std::path::Path::new("data/proposals.db"))?;
//! let details = ProposalAggregator::new(&storage, FetchPolicy::BestEffort).get_details(557)?;
//! assert_eq!(details.enriched_proposal_id, 557);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod aggregate;
pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod storage;

pub use aggregate::ProposalAggregator;
pub use config::{AppConfig, FetchPolicy, StoreConfig};
pub use crate::core::{ClassificationResult, Intent, ProposalDetails};
pub use error::{Error, Result};
