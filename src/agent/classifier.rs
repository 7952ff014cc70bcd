//! Query classifier agent.
//!
//! Sends the user's question together with the intent schema as the
//! structured-output contract, then validates the reply into an [`Intent`].
//! Models without `json_schema` support get the schema in the system prompt
//! and a plain-text response format instead.

use async_trait::async_trait;
use tracing::{debug, warn};

use super::config::AgentConfig;
use super::message::ResponseFormat;
use super::provider::LlmProvider;
use super::traits::Agent;
use crate::core::{ClassificationResult, Intent};
use crate::error::AgentError;

/// Schema name reported to the provider.
const REPLY_SCHEMA_NAME: &str = "intent_reply";

/// Reason given for blank input, which is never sent to the model.
pub const EMPTY_QUERY_REASON: &str = "The query is empty.";

/// Model families that accept `json_schema` response formats.
const STRUCTURED_OUTPUT_PREFIXES: [&str; 6] = ["gpt-4o", "gpt-4.1", "gpt-5", "o1", "o3", "o4"];

/// Snapshots inside those families that predate structured outputs.
const STRUCTURED_OUTPUT_EXCEPTIONS: [&str; 3] = ["gpt-4o-2024-05-13", "o1-preview", "o1-mini"];

/// Returns `true` if `model` accepts a `json_schema` response format.
#[must_use]
pub fn supports_json_schema(model: &str) -> bool {
    let model = model.to_ascii_lowercase();
    STRUCTURED_OUTPUT_PREFIXES
        .iter()
        .any(|prefix| model.starts_with(prefix))
        && !STRUCTURED_OUTPUT_EXCEPTIONS
            .iter()
            .any(|snapshot| model.starts_with(snapshot))
}

/// Agent that maps a free-text question onto one [`Intent`].
pub struct QueryClassifier {
    model: String,
    max_tokens: u32,
    system_prompt: String,
    structured: bool,
}

impl QueryClassifier {
    /// Creates a classifier with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        let structured = supports_json_schema(&config.classifier_model);
        let system_prompt = if structured {
            system_prompt
        } else {
            debug!(
                model = %config.classifier_model,
                "model lacks json_schema support; embedding schema in prompt"
            );
            format!(
                "{system_prompt}\n\nReply with one JSON object matching this schema and nothing else:\n{}",
                Intent::reply_schema()
            )
        };
        Self {
            model: config.classifier_model.clone(),
            max_tokens: config.classifier_max_tokens,
            system_prompt,
            structured,
        }
    }

    /// Classifies `text`.
    ///
    /// Blank input yields [`Intent::Error`] without calling the provider.
    /// Otherwise exactly one provider call is made. A model that declares
    /// the question unclassifiable also yields [`Intent::Error`]; that is a
    /// successful classification.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiRequest`] if the call fails and
    /// [`AgentError::ResponseParse`] if the reply matches no intent.
    pub async fn classify(
        &self,
        provider: &dyn LlmProvider,
        text: &str,
    ) -> Result<ClassificationResult, AgentError> {
        if text.trim().is_empty() {
            debug!("blank query; skipping provider call");
            return Ok(ClassificationResult::from_intent(Intent::error(
                EMPTY_QUERY_REASON,
            )));
        }

        let response = self.execute(provider, text).await?;
        if response.finish_reason.as_deref() == Some("length") {
            warn!(
                max_tokens = self.max_tokens,
                "classifier reply truncated at token limit"
            );
        }

        let intent = Intent::from_reply(&response.content)?;
        debug!(
            intent = intent.kind(),
            total_tokens = response.usage.total_tokens,
            "classified query"
        );
        Ok(ClassificationResult::from_intent(intent))
    }
}

#[async_trait]
impl Agent for QueryClassifier {
    fn name(&self) -> &'static str {
        "classifier"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn response_format(&self) -> ResponseFormat {
        if self.structured {
            ResponseFormat::JsonSchema {
                name: REPLY_SCHEMA_NAME.to_string(),
                schema: Intent::reply_schema(),
            }
        } else {
            ResponseFormat::Text
        }
    }

    fn temperature(&self) -> f32 {
        0.0
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::message::{ChatRequest, ChatResponse, Role, TokenUsage};
    use crate::agent::config::{DEFAULT_ADVISOR_MODEL, DEFAULT_CLASSIFIER_MODEL};
    use crate::agent::prompt::CLASSIFIER_SYSTEM_PROMPT;
    use std::sync::Mutex;
    use test_case::test_case;

    /// Provider that replays one scripted reply and records requests.
    struct ScriptedProvider {
        reply: Result<String, String>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedProvider {
        fn ok(content: &str) -> Self {
            Self {
                reply: Ok(content.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
            self.requests.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(content) => Ok(ChatResponse {
                    content: content.clone(),
                    usage: TokenUsage::default(),
                    finish_reason: Some("stop".to_string()),
                }),
                Err(message) => Err(AgentError::ApiRequest {
                    message: message.clone(),
                    status: Some(503),
                }),
            }
        }
    }

    fn classifier() -> QueryClassifier {
        let config = AgentConfig::builder()
            .api_key("test")
            .build()
            .unwrap_or_else(|_| unreachable!());
        QueryClassifier::new(&config, CLASSIFIER_SYSTEM_PROMPT.to_string())
    }

    #[test_case(r#"{"response": {"intent": "ProposalToRationaleQuery", "proposal": "p"}}"#, false; "proposal to rationale")]
    #[test_case(r#"{"response": {"intent": "RationaleToProposalQuery", "rationale": "r"}}"#, false; "rationale to proposal")]
    #[test_case(r#"{"response": {"intent": "MarketOpportunityQuery", "proposal": "p"}}"#, false; "market opportunity")]
    #[test_case(r#"{"response": {"intent": "Error", "error_reason": "off topic"}}"#, true; "declared error")]
    #[tokio::test]
    async fn test_envelope_tracks_variant(reply: &str, expect_error: bool) {
        let provider = ScriptedProvider::ok(reply);
        let result = classifier().classify(&provider, "question").await.unwrap();

        assert_eq!(result.is_error(), expect_error);
        let expected = Intent::from_reply(reply).unwrap();
        assert_eq!(result.intent(), Some(&expected));
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_blank_query_skips_provider() {
        let provider = ScriptedProvider::ok("unused");
        let result = classifier().classify(&provider, "   \n").await.unwrap();

        assert!(result.is_error());
        assert_eq!(result.message(), Some(EMPTY_QUERY_REASON));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_an_intent() {
        let provider = ScriptedProvider::failing("service unavailable");
        let err = classifier().classify(&provider, "question").await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_unmatched_reply_is_validation_failure() {
        let provider = ScriptedProvider::ok(r#"{"response": {"mood": "happy"}}"#);
        let err = classifier().classify(&provider, "question").await.unwrap_err();
        assert!(matches!(err, AgentError::ResponseParse { .. }));
    }

    #[tokio::test]
    async fn test_request_shape() {
        let provider = ScriptedProvider::ok(r#"{"response": {"intent": "Error"}}"#);
        let query = "x".repeat(20_000);
        classifier().classify(&provider, &query).await.unwrap();

        let requests = provider.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.model, DEFAULT_CLASSIFIER_MODEL);
        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[1].content.len(), 20_000);
        assert!(matches!(
            &request.response_format,
            ResponseFormat::JsonSchema { name, .. } if name == REPLY_SCHEMA_NAME
        ));
    }

    #[test_case("gpt-4o-2024-08-06", true; "gpt-4o snapshot")]
    #[test_case("gpt-4o-mini", true; "gpt-4o mini")]
    #[test_case("GPT-4.1", true; "case insensitive")]
    #[test_case("gpt-4-0613", false; "gpt-4 snapshot")]
    #[test_case("gpt-4o-2024-05-13", false; "early gpt-4o")]
    #[test_case("o1-mini", false; "o1 mini")]
    fn test_supports_json_schema(model: &str, expected: bool) {
        assert_eq!(supports_json_schema(model), expected);
    }

    #[test]
    fn test_default_model_accepts_json_schema() {
        assert!(supports_json_schema(DEFAULT_CLASSIFIER_MODEL));
        let classifier = classifier();
        assert!(matches!(
            classifier.response_format(),
            ResponseFormat::JsonSchema { .. }
        ));
        assert_eq!(classifier.system_prompt(), CLASSIFIER_SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn test_legacy_model_gets_schema_in_prompt() {
        let config = AgentConfig::builder()
            .api_key("test")
            .classifier_model(DEFAULT_ADVISOR_MODEL)
            .build()
            .unwrap_or_else(|_| unreachable!());
        let classifier = QueryClassifier::new(&config, CLASSIFIER_SYSTEM_PROMPT.to_string());
        let provider = ScriptedProvider::ok(
            "```json\n{\"response\": {\"intent\": \"RationaleToProposalQuery\", \"rationale\": \"r\"}}\n```",
        );

        let result = classifier.classify(&provider, "question").await.unwrap();
        assert!(!result.is_error());

        let requests = provider.requests.lock().unwrap();
        assert_eq!(requests[0].response_format, ResponseFormat::Text);
        assert!(requests[0].messages[0].content.starts_with(CLASSIFIER_SYSTEM_PROMPT));
        assert!(requests[0].messages[0].content.contains("error_reason"));
    }
}
