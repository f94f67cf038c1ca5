use anyhow::{anyhow, Result};
use async_trait::async_trait;
use genai::chat::{ChatMessage, ChatRequest};
use genai::Client;
use std::time::Duration;
use tokio::time::timeout;

use crate::config::Config;
use crate::llm::prompts;
use crate::models::FieldKind;

/// LLM provider families, used only to probe for credentials.
/// genai itself auto-detects the provider from the model id prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LLMProvider {
    Anthropic,
    OpenAI,
    Gemini,
}

impl LLMProvider {
    pub const ALL: [LLMProvider; 3] =
        [LLMProvider::Anthropic, LLMProvider::OpenAI, LLMProvider::Gemini];

    /// Environment variables that can hold this provider's API key.
    pub fn api_key_env_vars(&self) -> &'static [&'static str] {
        match self {
            LLMProvider::Anthropic => &["ANTHROPIC_API_KEY"],
            LLMProvider::OpenAI => &["OPENAI_API_KEY"],
            // GOOGLE_API_KEY is the legacy spelling some setups still use.
            LLMProvider::Gemini => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
        }
    }

    fn credential_present(&self) -> bool {
        self.api_key_env_vars()
            .iter()
            .any(|var| std::env::var(var).map(|v| !v.is_empty()).unwrap_or(false))
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(LLMProvider::Anthropic),
            "openai" | "gpt" => Ok(LLMProvider::OpenAI),
            "gemini" | "google" => Ok(LLMProvider::Gemini),
            _ => Err(anyhow!("Unknown LLM provider: {}", s)),
        }
    }
}

/// One question for the generation service.
#[derive(Debug, Clone)]
pub struct AnswerRequest {
    /// Literal question text as shown to the candidate.
    pub question: String,
    pub kind: FieldKind,
    pub required: bool,
    /// Structured candidate context, serialized into the prompt.
    pub profile_context: serde_json::Value,
    /// When present, the back-end must return one of these verbatim.
    pub options: Option<Vec<String>>,
}

/// Answer Generation Service boundary. The resolver only sees this trait, so
/// tests can substitute counting or failing fakes.
#[async_trait]
pub trait AnswerSource: Send + Sync {
    async fn generate(&self, request: &AnswerRequest) -> Result<String>;
}

/// genai-backed generator with a ranked back-end ladder and per-call timeout.
pub struct AnswerGenerator {
    client: Client,
    models: Vec<String>,
    call_timeout: Duration,
}

impl AnswerGenerator {
    pub fn new(models: Vec<String>, call_timeout: Duration) -> Self {
        Self {
            client: Client::default(),
            models,
            call_timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.generation_models.clone(), config.generation_timeout)
    }

    /// Whether any provider credential is configured. Absence is a normal,
    /// handled condition: resolution skips straight to the heuristic tier.
    pub fn credentials_present() -> bool {
        LLMProvider::ALL.iter().any(|p| p.credential_present())
    }
}

#[async_trait]
impl AnswerSource for AnswerGenerator {
    async fn generate(&self, request: &AnswerRequest) -> Result<String> {
        let prompt = prompts::format_answer_request(request);
        let chat_request = ChatRequest::new(vec![
            ChatMessage::system(prompts::ANSWER_SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ]);

        for model in &self.models {
            match timeout(
                self.call_timeout,
                self.client.exec_chat(model, chat_request.clone(), None),
            )
            .await
            {
                Ok(Ok(response)) => {
                    if let Some(text) = response.first_text() {
                        let answer = text.trim();
                        if !answer.is_empty() {
                            tracing::debug!("Generated answer via {}: {:?}", model, answer);
                            return Ok(answer.to_string());
                        }
                    }
                    tracing::warn!("Empty response from {}, trying next back-end", model);
                }
                Ok(Err(e)) => {
                    tracing::warn!("Generation back-end {} failed: {}", model, e);
                }
                Err(_) => {
                    tracing::warn!(
                        "Generation back-end {} timed out after {:?}",
                        model,
                        self.call_timeout
                    );
                }
            }
        }

        Err(anyhow!("All generation back-ends failed or timed out"))
    }
}
