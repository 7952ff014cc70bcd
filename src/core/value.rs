//! Column values and row normalization.
//!
//! Rows read from the store may carry binary payloads, exact decimals and
//! timestamps. Before anything downstream (typed decoding, JSON export, prompt
//! building) sees a row it is normalized so that only null, integer, float,
//! and text values remain.

use chrono::{NaiveDateTime, Timelike};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Map, Value};

/// A single column value as read from the store.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL `NULL`.
    Null,
    /// Integer (also used for boolean flags).
    Integer(i64),
    /// Floating-point number.
    Real(f64),
    /// Exact decimal.
    Decimal(Decimal),
    /// Text.
    Text(String),
    /// Binary payload.
    Blob(Vec<u8>),
    /// Timestamp without zone.
    Timestamp(NaiveDateTime),
}

impl SqlValue {
    /// Normalizes the value.
    ///
    /// - `Blob` → `Text` (UTF-8, invalid sequences replaced)
    /// - `Decimal` → `Real` (precision loss accepted)
    /// - `Timestamp` → `Text` in ISO-8601 (`YYYY-MM-DDTHH:MM:SS[.ffffff]`)
    ///
    /// Every other value is returned unchanged, so normalizing twice is the
    /// same as normalizing once.
    #[must_use]
    pub fn normalize(self) -> Self {
        match self {
            Self::Blob(bytes) => Self::Text(String::from_utf8_lossy(&bytes).into_owned()),
            Self::Decimal(d) => Self::Real(d.to_f64().unwrap_or_default()),
            Self::Timestamp(ts) => Self::Text(iso8601(&ts)),
            other => other,
        }
    }

    /// Returns `true` if the value holds no binary, decimal, or timestamp data.
    #[must_use]
    pub const fn is_normalized(&self) -> bool {
        !matches!(
            self,
            Self::Blob(_) | Self::Decimal(_) | Self::Timestamp(_)
        )
    }

    /// Converts to JSON, normalizing first.
    ///
    /// Non-finite floats have no JSON representation and become `null`.
    #[must_use]
    pub fn into_json(self) -> Value {
        match self.normalize() {
            Self::Null => Value::Null,
            Self::Integer(i) => Value::from(i),
            Self::Real(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
            Self::Text(s) => Value::String(s),
            Self::Blob(_) | Self::Decimal(_) | Self::Timestamp(_) => Value::Null,
        }
    }
}

/// Renders a timestamp the way ISO-8601 `isoformat` does: microseconds only
/// when non-zero.
fn iso8601(ts: &NaiveDateTime) -> String {
    if ts.nanosecond() == 0 {
        ts.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        ts.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

/// A column-labeled row, in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, SqlValue)>,
}

impl Row {
    /// Creates an empty row.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    /// Appends a column.
    pub fn push(&mut self, name: impl Into<String>, value: SqlValue) {
        self.columns.push((name.into(), value));
    }

    /// Looks up a column by label.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(label, _)| label == name)
            .map(|(_, value)| value)
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Normalizes every column value.
    #[must_use]
    pub fn normalize(self) -> Self {
        Self {
            columns: self
                .columns
                .into_iter()
                .map(|(name, value)| (name, value.normalize()))
                .collect(),
        }
    }

    /// Returns `true` if every column is normalized.
    #[must_use]
    pub fn is_normalized(&self) -> bool {
        self.columns.iter().all(|(_, value)| value.is_normalized())
    }

    /// Converts the row to a JSON object keyed by column label.
    #[must_use]
    pub fn into_json(self) -> Value {
        let map: Map<String, Value> = self
            .columns
            .into_iter()
            .map(|(name, value)| (name, value.into_json()))
            .collect();
        Value::Object(map)
    }
}

impl FromIterator<(String, SqlValue)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, SqlValue)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}
