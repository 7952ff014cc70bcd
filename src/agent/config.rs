//! LLM client configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::AgentError;

/// Default provider name.
const DEFAULT_PROVIDER: &str = "openai";
/// Default classifier model. Must accept `json_schema` response formats.
pub const DEFAULT_CLASSIFIER_MODEL: &str = "gpt-4o-2024-08-06";
/// Default advisor model. The advisor replies in plain text.
pub const DEFAULT_ADVISOR_MODEL: &str = "gpt-4-0613";
/// Default classifier max tokens. A classification reply is a single small
/// JSON object.
const DEFAULT_CLASSIFIER_MAX_TOKENS: u32 = 512;
/// Default advisor max tokens.
const DEFAULT_ADVISOR_MAX_TOKENS: u32 = 300;
/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration for the LLM-backed components.
#[derive(Clone)]
pub struct AgentConfig {
    /// LLM provider name (e.g., "openai").
    pub provider: String,
    /// API key for the provider.
    pub api_key: String,
    /// Optional base URL override (for proxies or compatible APIs).
    pub base_url: Option<String>,
    /// Model used to classify queries.
    pub classifier_model: String,
    /// Model used to write advice.
    pub advisor_model: String,
    /// Maximum tokens for classifier responses.
    pub classifier_max_tokens: u32,
    /// Maximum tokens for advisor responses.
    pub advisor_max_tokens: u32,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Directory containing prompt template files.
    ///
    /// Missing files fall back to compiled-in defaults.
    pub prompt_dir: Option<PathBuf>,
}

impl AgentConfig {
    /// Creates a new builder for `AgentConfig`.
    #[must_use]
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key is found.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::builder().from_env().build()
    }
}

impl std::fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConfig")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("classifier_model", &self.classifier_model)
            .field("advisor_model", &self.advisor_model)
            .field("classifier_max_tokens", &self.classifier_max_tokens)
            .field("advisor_max_tokens", &self.advisor_max_tokens)
            .field("timeout", &self.timeout)
            .field("prompt_dir", &self.prompt_dir)
            .finish()
    }
}

/// Builder for [`AgentConfig`].
#[derive(Debug, Clone, Default)]
pub struct AgentConfigBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    classifier_model: Option<String>,
    advisor_model: Option<String>,
    classifier_max_tokens: Option<u32>,
    advisor_max_tokens: Option<u32>,
    timeout: Option<Duration>,
    prompt_dir: Option<PathBuf>,
}

impl AgentConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(mut self) -> Self {
        if self.provider.is_none() {
            self.provider = std::env::var("ADVISOR_PROVIDER").ok();
        }
        if self.api_key.is_none() {
            self.api_key = std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty());
        }
        if self.base_url.is_none() {
            self.base_url = std::env::var("OPENAI_BASE_URL").ok();
        }
        if self.classifier_model.is_none() {
            self.classifier_model = std::env::var("ADVISOR_CLASSIFIER_MODEL").ok();
        }
        if self.advisor_model.is_none() {
            self.advisor_model = std::env::var("ADVISOR_MODEL").ok();
        }
        if self.timeout.is_none() {
            self.timeout = std::env::var("ADVISOR_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs);
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = std::env::var("ADVISOR_PROMPT_DIR").ok().map(PathBuf::from);
        }
        self
    }

    /// Sets the LLM provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL override.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the classifier model.
    #[must_use]
    pub fn classifier_model(mut self, model: impl Into<String>) -> Self {
        self.classifier_model = Some(model.into());
        self
    }

    /// Sets the advisor model.
    #[must_use]
    pub fn advisor_model(mut self, model: impl Into<String>) -> Self {
        self.advisor_model = Some(model.into());
        self
    }

    /// Sets the classifier max tokens.
    #[must_use]
    pub const fn classifier_max_tokens(mut self, n: u32) -> Self {
        self.classifier_max_tokens = Some(n);
        self
    }

    /// Sets the advisor max tokens.
    #[must_use]
    pub const fn advisor_max_tokens(mut self, n: u32) -> Self {
        self.advisor_max_tokens = Some(n);
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }

    /// Sets the prompt template directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Builds the [`AgentConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key was set, or
    /// [`AgentError::InvalidConfig`] for a zero timeout or token limit.
    pub fn build(self) -> Result<AgentConfig, AgentError> {
        let api_key = self.api_key.ok_or(AgentError::ApiKeyMissing)?;

        let timeout = self
            .timeout
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        if timeout.is_zero() {
            return Err(AgentError::InvalidConfig {
                message: "timeout must be greater than zero".to_string(),
            });
        }

        let classifier_max_tokens = self
            .classifier_max_tokens
            .unwrap_or(DEFAULT_CLASSIFIER_MAX_TOKENS);
        let advisor_max_tokens = self
            .advisor_max_tokens
            .unwrap_or(DEFAULT_ADVISOR_MAX_TOKENS);
        if classifier_max_tokens == 0 || advisor_max_tokens == 0 {
            return Err(AgentError::InvalidConfig {
                message: "max tokens must be greater than zero".to_string(),
            });
        }

        Ok(AgentConfig {
            provider: self
                .provider
                .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            api_key,
            base_url: self.base_url,
            classifier_model: self
                .classifier_model
                .unwrap_or_else(|| DEFAULT_CLASSIFIER_MODEL.to_string()),
            advisor_model: self
                .advisor_model
                .unwrap_or_else(|| DEFAULT_ADVISOR_MODEL.to_string()),
            classifier_max_tokens,
            advisor_max_tokens,
            timeout,
            prompt_dir: self.prompt_dir,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = AgentConfig::builder()
            .api_key("test-key")
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.provider, "openai");
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.classifier_model, DEFAULT_CLASSIFIER_MODEL);
        assert_eq!(config.advisor_model, DEFAULT_ADVISOR_MODEL);
        assert_eq!(config.advisor_max_tokens, 300);
        assert_eq!(config.classifier_max_tokens, DEFAULT_CLASSIFIER_MAX_TOKENS);
        assert!(config.prompt_dir.is_none());
    }

    #[test]
    fn test_builder_missing_api_key() {
        let result = AgentConfig::builder().build();
        assert!(matches!(result, Err(AgentError::ApiKeyMissing)));
    }

    #[test]
    fn test_builder_custom_values() {
        let config = AgentConfig::builder()
            .api_key("key")
            .provider("custom")
            .classifier_model("gpt-4o-mini")
            .advisor_max_tokens(120)
            .timeout(Duration::from_secs(5))
            .prompt_dir("/tmp/prompts")
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.provider, "custom");
        assert_eq!(config.classifier_model, "gpt-4o-mini");
        assert_eq!(config.advisor_max_tokens, 120);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.prompt_dir, Some(PathBuf::from("/tmp/prompts")));
    }

    #[test]
    fn test_builder_rejects_zero_limits() {
        let zero_timeout = AgentConfig::builder()
            .api_key("key")
            .timeout(Duration::ZERO)
            .build();
        assert!(matches!(zero_timeout, Err(AgentError::InvalidConfig { .. })));

        let zero_tokens = AgentConfig::builder()
            .api_key("key")
            .classifier_max_tokens(0)
            .build();
        assert!(matches!(zero_tokens, Err(AgentError::InvalidConfig { .. })));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = AgentConfig::builder()
            .api_key("sk-secret")
            .build()
            .unwrap_or_else(|_| unreachable!());
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }
}
