//! Typed records for enriched proposals.
//!
//! Records are decoded from normalized [`Row`]s through their JSON form, so
//! the same field names serve the store, the export file, and the prompts.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::value::Row;

/// A portfolio rule evaluated against a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintRecord {
    /// Owning proposal.
    pub enriched_proposal_id: i64,
    /// Rule name, e.g. `32% < Equity < 50%`.
    pub name: String,
    /// Whether the rule is violated.
    #[serde(deserialize_with = "flag")]
    pub violated: bool,
    /// Scope the rule applies to.
    #[serde(default)]
    pub rule_scope: Option<String>,
    /// Validation mode (hard/soft).
    #[serde(default)]
    pub validation_mode: Option<String>,
    /// Rule group type.
    #[serde(default)]
    pub rule_group_type: Option<String>,
}

/// Direction of a suggested order.
///
/// Values other than `BUY` and `SELL` are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransactionType {
    /// Buy units.
    Buy,
    /// Sell units.
    Sell,
    /// Any other provider-specific value.
    Other(String),
}

impl TransactionType {
    /// Returns the upper-case wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Other(s) => s,
        }
    }

    /// Returns the verb with only its first letter capitalized (`Buy`).
    #[must_use]
    pub fn verb(&self) -> String {
        let lower = self.as_str().to_lowercase();
        let mut chars = lower.chars();
        chars.next().map_or_else(String::new, |first| {
            first.to_uppercase().chain(chars).collect()
        })
    }
}

impl From<String> for TransactionType {
    fn from(value: String) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "BUY" => Self::Buy,
            "SELL" => Self::Sell,
            _ => Self::Other(value),
        }
    }
}

impl From<TransactionType> for String {
    fn from(value: TransactionType) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A suggested order for a proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Order id.
    pub id: i64,
    /// Buy or sell.
    pub transaction_type: TransactionType,
    /// Instrument identifier (ISIN).
    #[serde(default)]
    pub isin: Option<String>,
    /// Units to trade.
    #[serde(deserialize_with = "integer")]
    pub quantity: i64,
    /// Currency the order is settled in.
    #[serde(default)]
    pub cash_currency_used: Option<String>,
    /// Quantity after lot-size adjustment.
    #[serde(default)]
    pub adjusted_quantity: Option<f64>,
    /// Position size the order aims for.
    #[serde(default)]
    pub target_quantity: Option<f64>,
}

/// Violated constraints and suggested orders for one proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalDetails {
    /// Proposal id the bundle is keyed by.
    pub enriched_proposal_id: i64,
    /// Violated constraints.
    #[serde(rename = "enriched_proposal_evaluated_constraints")]
    pub constraints: Vec<ConstraintRecord>,
    /// Suggested orders.
    #[serde(rename = "enriched_proposals_orders")]
    pub orders: Vec<OrderRecord>,
    /// Store failures downgraded to empty lists while assembling the bundle.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fetch_errors: Vec<String>,
}

impl ProposalDetails {
    /// Creates an empty bundle for the given proposal.
    #[must_use]
    pub const fn empty(enriched_proposal_id: i64) -> Self {
        Self {
            enriched_proposal_id,
            constraints: Vec::new(),
            orders: Vec::new(),
            fetch_errors: Vec::new(),
        }
    }

    /// Returns `true` if any fetch was downgraded.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.fetch_errors.is_empty()
    }
}

/// Decodes a row into a typed record after normalizing it.
///
/// # Errors
///
/// Returns the `serde_json` error when a column is missing or mistyped.
pub fn decode_row<T: DeserializeOwned>(row: Row) -> Result<T, serde_json::Error> {
    serde_json::from_value(row.normalize().into_json())
}

/// Accepts `true`/`false` or any integer (non-zero is true).
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|f| f != 0.0)),
        other => Err(de::Error::custom(format!("expected flag, got {other}"))),
    }
}

/// Accepts an integer or an integral float (decimal columns arrive as floats).
fn integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    as_integer(&value).ok_or_else(|| de::Error::custom(format!("expected integer, got {value}")))
}

#[allow(clippy::cast_possible_truncation)]
fn as_integer(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
            .map(|f| f as i64)
    })
}
