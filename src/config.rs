//! Application configuration.
//!
//! Built once at process start from CLI flags and environment variables,
//! then threaded into the store and the LLM client. Nothing below this
//! layer reads the environment.

use std::path::PathBuf;

use crate::agent::config::AgentConfig;
use crate::error::AgentError;

/// Default database location, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "data/proposals.db";

/// Default export location for `export`.
pub const DEFAULT_EXPORT_PATH: &str = "data/all_enriched_proposal_details.json";

/// What the aggregator does when a store read fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FetchPolicy {
    /// Log the failure and continue with an empty list.
    #[default]
    BestEffort,
    /// Propagate the failure to the caller.
    FailFast,
}

impl FetchPolicy {
    /// Parses a policy name (`best-effort` or `fail-fast`, case-insensitive,
    /// `_` accepted for `-`).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "best-effort" => Some(Self::BestEffort),
            "fail-fast" => Some(Self::FailFast),
            _ => None,
        }
    }

    /// Returns the canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BestEffort => "best-effort",
            Self::FailFast => "fail-fast",
        }
    }
}

impl std::fmt::Display for FetchPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relational store settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Path to the `SQLite` database.
    pub db_path: PathBuf,
    /// Failure policy for record fetches.
    pub fetch_policy: FetchPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            fetch_policy: FetchPolicy::default(),
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Store settings.
    pub store: StoreConfig,
    /// LLM settings; `None` when no API key was found.
    pub agent: Option<AgentConfig>,
}

impl AppConfig {
    /// Assembles the configuration.
    ///
    /// A missing API key is not an error here: commands that never call the
    /// model still work. [`AppConfig::require_agent`] reports it when needed.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] for invalid agent settings other than a
    /// missing key.
    pub fn new(
        store: StoreConfig,
        agent: Result<AgentConfig, AgentError>,
    ) -> Result<Self, AgentError> {
        let agent = match agent {
            Ok(config) => Some(config),
            Err(AgentError::ApiKeyMissing) => None,
            Err(e) => return Err(e),
        };
        Ok(Self { store, agent })
    }

    /// Returns the agent configuration or [`AgentError::ApiKeyMissing`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no key was configured.
    pub fn require_agent(&self) -> Result<&AgentConfig, AgentError> {
        self.agent.as_ref().ok_or(AgentError::ApiKeyMissing)
    }
}
