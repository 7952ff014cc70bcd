//! LLM-backed agents.
//!
//! Two single-call agents sit behind a pluggable provider abstraction backed
//! by OpenAI-compatible APIs.
//!
//! # Architecture
//!
//! ```text
//! question ─→ QueryClassifier ─→ provider (JSON schema) ─→ Intent::from_reply ─→ ClassificationResult
//! ProposalDetails ─→ build_advice_prompt ─→ AdvisorAgent ─→ provider (text) ─→ Advice
//! ```

pub mod advisor;
pub mod classifier;
pub mod client;
pub mod config;
pub mod message;
pub mod prompt;
pub mod provider;
pub mod providers;
pub mod traits;

// Re-export key types
pub use advisor::{Advice, AdvisorAgent};
pub use classifier::QueryClassifier;
pub use client::create_provider;
pub use config::AgentConfig;
pub use message::{ChatMessage, ChatRequest, ChatResponse, ResponseFormat, Role, TokenUsage};
pub use prompt::PromptSet;
pub use provider::LlmProvider;
pub use traits::{Agent, AgentResponse};
