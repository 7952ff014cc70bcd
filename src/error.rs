//! Error types for proposal-advisor.
//!
//! Errors are layered by concern: storage access, LLM interaction, and CLI
//! command execution. The umbrella [`Error`] converts from each so commands
//! can use `?` freely.

use thiserror::Error;

/// Convenience result alias using the crate-wide [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Relational store failure.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// LLM provider or response validation failure.
    #[error("agent error: {0}")]
    Agent(#[from] AgentError),

    /// CLI command failure.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// Filesystem or stream I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while reading from the relational store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying `SQLite` failure (open, prepare, step).
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The proposal tables have not been created yet.
    #[error("database not initialized. Run `proposal-advisor init` first.")]
    NotInitialized,

    /// A row could not be decoded into its typed record.
    #[error("failed to decode row from {table}: {message}")]
    RowDecode {
        /// Source table.
        table: &'static str,
        /// Decoder message.
        message: String,
    },
}

/// Errors raised by the LLM layer.
///
/// [`AgentError::ApiRequest`] is a transport failure and
/// [`AgentError::ResponseParse`] a validation failure. Neither is a
/// classification outcome: a model that *declares* a query unclassifiable
/// produces [`Intent::Error`](crate::core::Intent::Error) instead.
#[derive(Debug, Error)]
pub enum AgentError {
    /// No API key found in configuration or environment.
    #[error("no API key configured. Set OPENAI_API_KEY.")]
    ApiKeyMissing,

    /// The configured provider name is not known.
    #[error("unsupported provider: {name}")]
    UnsupportedProvider {
        /// Provider name as configured.
        name: String,
    },

    /// The completion call failed outright.
    #[error("API request failed: {message}")]
    ApiRequest {
        /// Provider error message.
        message: String,
        /// HTTP status, when the provider reported one.
        status: Option<u16>,
    },

    /// The completion returned output that matches no expected shape.
    #[error("invalid model response: {message}")]
    ResponseParse {
        /// What failed to validate.
        message: String,
        /// Raw model output.
        content: String,
    },

    /// Configuration could not be assembled.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },
}

impl AgentError {
    /// Returns `true` for failures of the call itself rather than its content.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::ApiRequest { .. })
    }
}

/// Errors raised by CLI commands.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The command could not complete.
    #[error("{0}")]
    ExecutionFailed(String),

    /// Output could not be rendered.
    #[error("output formatting failed: {0}")]
    OutputFormat(String),

    /// User input was rejected.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_converts() {
        let err: Error = StorageError::NotInitialized.into();
        assert!(matches!(err, Error::Storage(StorageError::NotInitialized)));
        assert!(err.to_string().contains("init"));
    }

    #[test]
    fn test_transport_vs_validation() {
        let transport = AgentError::ApiRequest {
            message: "connection reset".to_string(),
            status: None,
        };
        let validation = AgentError::ResponseParse {
            message: "no variant matched".to_string(),
            content: "{}".to_string(),
        };
        assert!(transport.is_transport());
        assert!(!validation.is_transport());
    }
}
