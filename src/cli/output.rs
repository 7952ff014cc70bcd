//! Output formatting for CLI commands.
//!
//! Text is for people; `json` and `ndjson` are for scripts and keep stdout
//! free of anything else.

#![allow(clippy::format_push_string)]

use std::fmt::Write;

use serde::Serialize;

use crate::agent::Advice;
use crate::core::{ClassificationResult, ProposalDetails};

/// Output format for command results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
    /// One compact JSON document per line.
    Ndjson,
}

impl OutputFormat {
    /// Parses a format name, falling back to [`OutputFormat::Text`].
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            "ndjson" | "jsonl" => Self::Ndjson,
            _ => Self::Text,
        }
    }

    /// Serializes `value` in this format's JSON flavor, newline-terminated.
    #[must_use]
    pub fn to_json<T: Serialize + ?Sized>(self, value: &T) -> String {
        let rendered = match self {
            Self::Ndjson => serde_json::to_string(value),
            Self::Text | Self::Json => serde_json::to_string_pretty(value),
        };
        let mut out = rendered.unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"));
        out.push('\n');
        out
    }
}

/// Formats a classification result.
#[must_use]
pub fn format_classification(result: &ClassificationResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => match (result.intent(), result.message()) {
            (Some(intent), _) if !result.is_error() => format!("{intent}\n"),
            (_, Some(message)) => format!("Error: {message}\n"),
            (Some(intent), None) => format!("{intent}\n"),
            (None, None) => "Error\n".to_string(),
        },
        OutputFormat::Json | OutputFormat::Ndjson => format.to_json(result),
    }
}

/// Formats one proposal bundle.
#[must_use]
pub fn format_details(details: &ProposalDetails, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => details_text(details),
        OutputFormat::Json | OutputFormat::Ndjson => format.to_json(details),
    }
}

/// Formats advice for one proposal.
#[must_use]
pub fn format_advice(advice: &Advice, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut out = format!(
                "Financial advice for enriched_proposal_id {}:\n\n{}\n",
                advice.enriched_proposal_id, advice.advice
            );
            if !advice.fetch_errors.is_empty() {
                out.push_str("\nWarning: proposal data was incomplete:\n");
                for error in &advice.fetch_errors {
                    out.push_str(&format!("  - {error}\n"));
                }
            }
            out
        }
        OutputFormat::Json | OutputFormat::Ndjson => format.to_json(advice),
    }
}

fn details_text(details: &ProposalDetails) -> String {
    let mut out = format!("Proposal {}\n", details.enriched_proposal_id);

    let _ = writeln!(
        out,
        "\nViolated constraints ({}):",
        details.constraints.len()
    );
    if details.constraints.is_empty() {
        out.push_str("  (none)\n");
    }
    for constraint in &details.constraints {
        let _ = writeln!(out, "  - {}", constraint.name);
    }

    let _ = writeln!(out, "\nOrders ({}):", details.orders.len());
    if details.orders.is_empty() {
        out.push_str("  (none)\n");
    }
    for order in &details.orders {
        let _ = write!(
            out,
            "  #{:<4} {:<4} {:>8} {}",
            order.id,
            order.transaction_type,
            order.quantity,
            order.isin.as_deref().unwrap_or("-"),
        );
        if let Some(target) = order.target_quantity {
            let _ = write!(out, " (target {target})");
        }
        out.push('\n');
    }

    if !details.fetch_errors.is_empty() {
        out.push_str("\nFetch errors:\n");
        for error in &details.fetch_errors {
            let _ = writeln!(out, "  - {error}");
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Intent, OrderRecord, TransactionType};

    #[test]
    fn test_parse_format() {
        assert_eq!(OutputFormat::parse("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::parse("ndjson"), OutputFormat::Ndjson);
        assert_eq!(OutputFormat::parse("yaml"), OutputFormat::Text);
    }

    #[test]
    fn test_ndjson_is_single_line() {
        let out = OutputFormat::Ndjson.to_json(&serde_json::json!({"a": [1, 2]}));
        assert_eq!(out, "{\"a\":[1,2]}\n");
    }

    #[test]
    fn test_format_classification_text() {
        let ok = ClassificationResult::from_intent(Intent::RationaleToProposalQuery {
            rationale: "reduce risk".to_string(),
        });
        assert!(!format_classification(&ok, OutputFormat::Text).starts_with("Error"));

        let err = ClassificationResult::from_intent(Intent::error("not a portfolio question"));
        assert_eq!(
            format_classification(&err, OutputFormat::Text),
            "Error: not a portfolio question\n"
        );
    }

    #[test]
    fn test_details_text() {
        let mut details = ProposalDetails::empty(557);
        details.orders.push(OrderRecord {
            id: 3,
            transaction_type: TransactionType::Buy,
            isin: None,
            quantity: 50,
            cash_currency_used: None,
            adjusted_quantity: None,
            target_quantity: Some(150.0),
        });
        details.fetch_errors.push("constraints: boom".to_string());

        let text = format_details(&details, OutputFormat::Text);
        assert!(text.starts_with("Proposal 557\n"));
        assert!(text.contains("Violated constraints (0):\n  (none)"));
        assert!(text.contains("(target 150)"));
        assert!(text.contains("Fetch errors:\n  - constraints: boom"));
    }
}
