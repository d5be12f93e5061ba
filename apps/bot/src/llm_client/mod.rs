//! LLM client, the single point of entry for chat-completion calls.
//!
//! Talks to an OpenAI-compatible `/chat/completions` endpoint. Failures are
//! returned as structured `CompletionError`s so the generation layer can
//! classify them without string-matching on transport internals.
//!
//! Every call is attempted exactly once.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Rate limit exceeded: {message}")]
    RateLimited { message: String },

    #[error("{message}")]
    Api {
        status: u16,
        kind: &'static str,
        message: String,
    },

    #[error("JSON parse error: {0}")]
    Parse(String),

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl CompletionError {
    /// Provider-style class name, used in operator alerts.
    pub fn type_name(&self) -> &'static str {
        match self {
            CompletionError::Timeout(_) => "APITimeoutError",
            CompletionError::Connection(_) => "APIConnectionError",
            CompletionError::RateLimited { .. } => "RateLimitError",
            CompletionError::Api { kind, .. } => *kind,
            CompletionError::Parse(_) => "JSONDecodeError",
            CompletionError::EmptyContent => "EmptyContentError",
        }
    }

    fn from_transport(e: reqwest::Error) -> Self {
        let e = e.without_url();
        if e.is_timeout() {
            CompletionError::Timeout(e.to_string())
        } else if e.is_decode() {
            CompletionError::Parse(e.to_string())
        } else {
            CompletionError::Connection(e.to_string())
        }
    }
}

/// Maps a non-success HTTP answer to the matching error.
fn error_from_status(status: u16, body: &str) -> CompletionError {
    let message = format!("Error code: {status} - {body}");
    let kind = match status {
        429 => return CompletionError::RateLimited { message },
        400 => "BadRequestError",
        401 => "AuthenticationError",
        403 => "PermissionDeniedError",
        404 => "NotFoundError",
        409 => "ConflictError",
        422 => "UnprocessableEntityError",
        500..=599 => "InternalServerError",
        _ => "APIStatusError",
    };
    CompletionError::Api {
        status,
        kind,
        message,
    }
}

/// The two messages of one completion call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
}

/// Anything that can turn a prompt into text.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError>;
}

#[derive(Debug, Clone)]
pub struct CompletionSettings {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

impl ChatResponse {
    /// Trimmed content of the first choice, if it has any.
    fn into_text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|t| t.trim().to_string())
    }
}

#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    settings: CompletionSettings,
}

impl LlmClient {
    pub fn new(settings: CompletionSettings) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self { client, settings })
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    fn build_body<'a>(&'a self, request: &'a CompletionRequest) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.settings.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        }
    }
}

#[async_trait]
impl CompletionBackend for LlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let url = format!(
            "{}/chat/completions",
            self.settings.api_base.trim_end_matches('/')
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(self.settings.api_key.trim())
            .json(&self.build_body(request))
            .send()
            .await
            .map_err(CompletionError::from_transport)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(CompletionError::from_transport)?;

        if !status.is_success() {
            return Err(error_from_status(status.as_u16(), &body));
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| CompletionError::Parse(e.to_string()))?;

        if let Some(usage) = &parsed.usage {
            debug!(
                "Completion succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        parsed
            .into_text()
            .filter(|t| !t.is_empty())
            .ok_or(CompletionError::EmptyContent)
    }
}
