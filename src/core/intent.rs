//! Closed set of structured outcomes for a classification call.
//!
//! The model is asked to reply with a JSON object of the shape
//! `{"response": {"intent": "<Variant>", ...payload}}`. [`Intent::from_reply`]
//! is the single conversion step from raw model text onto the sum type; any
//! reply that matches no variant is a validation failure, never an
//! [`Intent::Error`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AgentError;

/// Reason used when the model returns an `Error` intent without one.
pub const DEFAULT_ERROR_REASON: &str = "The reason why the query is invalid.";

/// Intent of a user query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "intent")]
pub enum Intent {
    /// Explain the rationale behind a proposal.
    ProposalToRationaleQuery {
        /// The proposal that needs to be converted to a rationale.
        proposal: String,
    },
    /// Derive a proposal from a stated rationale.
    RationaleToProposalQuery {
        /// The rationale that needs to be converted to a proposal.
        rationale: String,
    },
    /// Identify market opportunities around a proposal.
    MarketOpportunityQuery {
        /// The proposal to look for market opportunities around.
        proposal: String,
    },
    /// The query cannot be mapped to a supported intent.
    Error {
        /// Why the query was rejected.
        #[serde(default = "default_error_reason")]
        error_reason: String,
    },
}

fn default_error_reason() -> String {
    DEFAULT_ERROR_REASON.to_string()
}

/// Wire envelope the model is asked to produce.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct IntentReply {
    /// The classified intent.
    pub response: Intent,
}

impl Intent {
    /// Builds an `Error` intent with the given reason.
    #[must_use]
    pub fn error(reason: impl Into<String>) -> Self {
        Self::Error {
            error_reason: reason.into(),
        }
    }

    /// Returns `true` for the `Error` variant.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::Error { .. })
    }

    /// Variant name as it appears in the `intent` tag.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ProposalToRationaleQuery { .. } => "ProposalToRationaleQuery",
            Self::RationaleToProposalQuery { .. } => "RationaleToProposalQuery",
            Self::MarketOpportunityQuery { .. } => "MarketOpportunityQuery",
            Self::Error { .. } => "Error",
        }
    }

    /// The variant's single text payload.
    #[must_use]
    pub fn payload(&self) -> &str {
        match self {
            Self::ProposalToRationaleQuery { proposal }
            | Self::MarketOpportunityQuery { proposal } => proposal,
            Self::RationaleToProposalQuery { rationale } => rationale,
            Self::Error { error_reason } => error_reason,
        }
    }

    /// Rejection reason for the `Error` variant.
    #[must_use]
    pub fn error_reason(&self) -> Option<&str> {
        match self {
            Self::Error { error_reason } => Some(error_reason),
            _ => None,
        }
    }

    /// JSON schema of [`IntentReply`], sent as the structured-output contract.
    #[must_use]
    pub fn reply_schema() -> Value {
        serde_json::to_value(schemars::schema_for!(IntentReply)).unwrap_or_default()
    }

    /// Maps a raw model reply onto an [`Intent`].
    ///
    /// Accepts the `{"response": {...}}` envelope or a bare variant object,
    /// optionally wrapped in a markdown code fence. The `intent` tag decides
    /// the variant when present; otherwise the payload field decides, in
    /// declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ResponseParse`] if the reply is not JSON or
    /// matches no variant.
    pub fn from_reply(content: &str) -> Result<Self, AgentError> {
        let json_str = strip_code_fence(content);

        let value: Value =
            serde_json::from_str(json_str).map_err(|e| AgentError::ResponseParse {
                message: format!("reply is not JSON: {e}"),
                content: content.to_string(),
            })?;

        let mut object = match value {
            Value::Object(mut outer) => match outer.remove("response") {
                Some(Value::Object(inner)) => inner,
                Some(_) => {
                    return Err(AgentError::ResponseParse {
                        message: "`response` is not an object".to_string(),
                        content: content.to_string(),
                    });
                }
                None => outer,
            },
            _ => {
                return Err(AgentError::ResponseParse {
                    message: "reply is not a JSON object".to_string(),
                    content: content.to_string(),
                });
            }
        };

        // A null or blank reason means "not given".
        if object.get("error_reason").is_some_and(is_blank) {
            object.insert("error_reason".to_string(), Value::from(DEFAULT_ERROR_REASON));
        }

        if object.contains_key("intent") {
            return serde_json::from_value(Value::Object(object)).map_err(|e| {
                AgentError::ResponseParse {
                    message: format!("reply matches no intent: {e}"),
                    content: content.to_string(),
                }
            });
        }

        Self::from_shape(&object).ok_or_else(|| AgentError::ResponseParse {
            message: "reply matches no intent".to_string(),
            content: content.to_string(),
        })
    }

    /// Untagged fallback: picks the first variant whose field is present.
    fn from_shape(object: &Map<String, Value>) -> Option<Self> {
        let text = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_string);

        if let Some(proposal) = text("proposal") {
            return Some(Self::ProposalToRationaleQuery { proposal });
        }
        if let Some(rationale) = text("rationale") {
            return Some(Self::RationaleToProposalQuery { rationale });
        }
        match object.get("error_reason") {
            Some(Value::String(reason)) => Some(Self::error(reason.clone())),
            _ => None,
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind(), self.payload())
    }
}

/// Strips a surrounding markdown code fence, if any.
fn is_blank(value: &Value) -> bool {
    value.is_null() || value.as_str().is_some_and(|s| s.trim().is_empty())
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    if trimmed.starts_with("```") {
        trimmed
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim()
    } else {
        trimmed
    }
}

/// Result envelope returned to callers of the classifier.
///
/// Constructed only through [`ClassificationResult::from_intent`], so
/// `is_error` always agrees with the wrapped intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    result: Option<Intent>,
    is_error: bool,
    message: Option<String>,
}

impl ClassificationResult {
    /// Wraps a validated intent.
    #[must_use]
    pub fn from_intent(intent: Intent) -> Self {
        let is_error = intent.is_error();
        let message = intent.error_reason().map(str::to_string);
        Self {
            result: Some(intent),
            is_error,
            message,
        }
    }

    /// The classified intent, if any.
    #[must_use]
    pub const fn intent(&self) -> Option<&Intent> {
        self.result.as_ref()
    }

    /// Whether this result reports an error.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.is_error
    }

    /// Human-readable message accompanying an error.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}
