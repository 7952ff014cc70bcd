//! Advisor agent.
//!
//! Turns a [`ProposalDetails`] bundle into a short plain-language summary of
//! the violated rules and the suggested corrective orders.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use super::config::AgentConfig;
use super::prompt::build_advice_prompt;
use super::provider::LlmProvider;
use super::traits::Agent;
use crate::core::ProposalDetails;
use crate::error::AgentError;

/// Advice written for one proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Advice {
    /// Proposal the advice is about.
    pub enriched_proposal_id: i64,
    /// Model-written summary.
    pub advice: String,
    /// Store failures that left the input incomplete.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fetch_errors: Vec<String>,
}

/// Agent that writes client-facing advice for a proposal.
pub struct AdvisorAgent {
    model: String,
    max_tokens: u32,
    system_prompt: String,
}

impl AdvisorAgent {
    /// Creates an advisor with the given configuration and system prompt.
    #[must_use]
    pub fn new(config: &AgentConfig, system_prompt: String) -> Self {
        Self {
            model: config.advisor_model.clone(),
            max_tokens: config.advisor_max_tokens,
            system_prompt,
        }
    }

    /// Writes advice for `details` with one provider call.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiRequest`] if the call fails and
    /// [`AgentError::ResponseParse`] if the model returns no text.
    pub async fn advise(
        &self,
        provider: &dyn LlmProvider,
        details: &ProposalDetails,
    ) -> Result<Advice, AgentError> {
        if details.is_degraded() {
            warn!(
                proposal_id = details.enriched_proposal_id,
                "advising on incomplete proposal data"
            );
        }

        let prompt = build_advice_prompt(details);
        let response = self.execute(provider, &prompt).await?;

        let advice = response.content.trim().to_string();
        if advice.is_empty() {
            return Err(AgentError::ResponseParse {
                message: "advisor returned no text".to_string(),
                content: response.content,
            });
        }

        debug!(
            proposal_id = details.enriched_proposal_id,
            total_tokens = response.usage.total_tokens,
            finish_reason = response.finish_reason.as_deref().unwrap_or("none"),
            "generated advice"
        );

        Ok(Advice {
            enriched_proposal_id: details.enriched_proposal_id,
            advice,
            fetch_errors: details.fetch_errors.clone(),
        })
    }
}

#[async_trait]
impl Agent for AdvisorAgent {
    fn name(&self) -> &'static str {
        "advisor"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn temperature(&self) -> f32 {
        0.2
    }

    fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
}
