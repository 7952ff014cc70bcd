//! Core domain types.
//!
//! Intents and their result envelope, proposal records, and the column
//! values rows are normalized through. Nothing here performs I/O.

pub mod intent;
pub mod records;
pub mod value;

pub use intent::{ClassificationResult, Intent, IntentReply};
pub use records::{ConstraintRecord, OrderRecord, ProposalDetails, TransactionType, decode_row};
pub use value::{Row, SqlValue};
