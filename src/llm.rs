use crate::error::{Error, Result};
use crate::http::HttpClient;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const ANTHROPIC_VERSION: &str = "2023-06-01";
/// The messages API requires a limit; OpenAI-compatible requests omit it unless configured.
const ANTHROPIC_DEFAULT_MAX_TOKENS: u32 = 4096;

/// LLM provider: determines API format, endpoint and credential variable.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Anthropic,
    OpenRouter,
    /// OpenAI itself or any OpenAI-compatible API (together.ai, local ollama, etc.)
    #[default]
    #[serde(rename = "openai")]
    OpenAi,
}

impl Provider {
    fn default_base_url(&self) -> &'static str {
        match self {
            Self::Anthropic => "https://api.anthropic.com/v1",
            Self::OpenRouter => "https://openrouter.ai/api/v1",
            Self::OpenAi => "https://api.openai.com/v1",
        }
    }

    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenRouter => "OPENROUTER_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// The remote chat service as seen by a session.
#[allow(async_fn_in_trait)]
pub trait ChatBackend {
    /// Model ids the service currently offers.
    async fn list_models(&self) -> Result<Vec<String>>;

    /// Send the full transcript and return the assistant's reply text.
    async fn complete(&self, model: &str, transcript: &[Message]) -> Result<String>;
}

pub struct LlmClient {
    provider: Provider,
    api_key: String,
    max_tokens: Option<u32>,
    base_url: String,
    http: HttpClient,
}

// -- Anthropic format --

#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<&'a Message>,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicBlock>,
}

#[derive(Deserialize)]
struct AnthropicBlock {
    text: Option<String>,
}

// -- OpenAI-compatible format --

#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    messages: &'a [Message],
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

// -- Shared --

/// `GET /models` has the same `{"data": [{"id": ...}]}` shape on every provider.
#[derive(Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

impl LlmClient {
    pub fn new(
        provider: Provider,
        api_key: String,
        max_tokens: Option<u32>,
        base_url: Option<String>,
    ) -> Result<Self> {
        let http = HttpClient::new(concat!("clirpiai/", env!("CARGO_PKG_VERSION")))?;
        let base_url = base_url
            .unwrap_or_else(|| provider.default_base_url().into())
            .trim_end_matches('/')
            .to_string();
        Ok(Self {
            provider,
            api_key,
            max_tokens,
            base_url,
            http,
        })
    }

    /// Build from config, reading the API key from the specified env var.
    ///
    /// Fails with [`Error::MissingCredential`] when the variable is unset or empty.
    pub fn from_config(
        provider: Provider,
        max_tokens: Option<u32>,
        api_key_env: Option<String>,
        base_url: Option<String>,
    ) -> Result<Self> {
        let env_var = api_key_env.unwrap_or_else(|| provider.default_api_key_env().into());
        let api_key = std::env::var(&env_var).unwrap_or_default();
        if api_key.trim().is_empty() {
            return Err(Error::MissingCredential { var: env_var });
        }
        Self::new(provider, api_key, max_tokens, base_url)
    }

    fn auth_headers(&self) -> Vec<(&'static str, String)> {
        match self.provider {
            Provider::Anthropic => vec![
                ("x-api-key", self.api_key.clone()),
                ("anthropic-version", ANTHROPIC_VERSION.into()),
            ],
            Provider::OpenRouter | Provider::OpenAi => {
                vec![("Authorization", format!("Bearer {}", self.api_key))]
            }
        }
    }

    async fn complete_anthropic(&self, model: &str, transcript: &[Message]) -> Result<String> {
        let system: Vec<&str> = transcript
            .iter()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .collect();
        let request = AnthropicRequest {
            model,
            max_tokens: self.max_tokens.unwrap_or(ANTHROPIC_DEFAULT_MAX_TOKENS),
            system: (!system.is_empty()).then(|| system.join("\n\n")),
            messages: transcript
                .iter()
                .filter(|m| m.role != Role::System)
                .collect(),
        };

        let body = serde_json::to_string(&request)
            .map_err(|e| Error::parse(format!("serialize request: {e}")))?;

        let url = format!("{}/messages", self.base_url);
        let response_text = self
            .http
            .post_json_raw(&url, &body, &self.auth_headers())
            .await
            .map_err(|e| {
                warn!("Anthropic API error: {e}");
                e
            })?;

        let resp: AnthropicResponse = serde_json::from_str(&response_text)
            .map_err(|e| Error::parse(format!("parse Anthropic response: {e}")))?;

        let text = resp
            .content
            .into_iter()
            .filter_map(|b| b.text)
            .collect::<Vec<_>>()
            .join("\n");
        if text.is_empty() {
            return Err(Error::parse("empty response from LLM"));
        }
        Ok(text)
    }

    async fn complete_openai(&self, model: &str, transcript: &[Message]) -> Result<String> {
        let request = OpenAiRequest {
            model,
            max_tokens: self.max_tokens,
            messages: transcript,
        };

        let body = serde_json::to_string(&request)
            .map_err(|e| Error::parse(format!("serialize request: {e}")))?;

        let url = format!("{}/chat/completions", self.base_url);
        let response_text = self
            .http
            .post_json_raw(&url, &body, &self.auth_headers())
            .await
            .map_err(|e| {
                warn!("LLM API error: {e}");
                e
            })?;

        let resp: OpenAiResponse = serde_json::from_str(&response_text)
            .map_err(|e| Error::parse(format!("parse LLM response: {e}")))?;

        resp.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::parse("empty response from LLM"))
    }
}

impl ChatBackend for LlmClient {
    async fn list_models(&self) -> Result<Vec<String>> {
        debug!(provider = ?self.provider, "listing models");

        let url = match self.provider {
            Provider::Anthropic => format!("{}/models?limit=1000", self.base_url),
            Provider::OpenRouter | Provider::OpenAi => format!("{}/models", self.base_url),
        };
        let response_text = self
            .http
            .get_text(&url, &self.auth_headers())
            .await
            .map_err(|e| {
                warn!("model listing failed: {e}");
                e
            })?;

        let list: ModelList = serde_json::from_str(&response_text)
            .map_err(|e| Error::parse(format!("parse model list: {e}")))?;
        Ok(list.data.into_iter().map(|m| m.id).collect())
    }

    async fn complete(&self, model: &str, transcript: &[Message]) -> Result<String> {
        debug!(
            provider = ?self.provider,
            model,
            messages = transcript.len(),
            "sending LLM request"
        );

        match self.provider {
            Provider::Anthropic => self.complete_anthropic(model, transcript).await,
            Provider::OpenRouter | Provider::OpenAi => {
                self.complete_openai(model, transcript).await
            }
        }
    }
}
