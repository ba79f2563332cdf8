//! Brief Generation Providers
//!
//! Unified interface for turning one topic plus business context into a
//! structured content brief via an LLM chat-completion API. Supports
//! OpenAI-compatible endpoints (hosted or local) and Anthropic while
//! keeping callers provider-agnostic.

use crate::config::business::BusinessContext;
use crate::error::BriefError;
use crate::sanitize;
use crate::types::{FaqEntry, GeneratedBrief, MapId, Topic};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub mod profile;

pub use profile::{ProviderConfig, ProviderType};

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// Completion options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub stop: Option<Vec<String>>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: Some(0.7),
            max_tokens: Some(2048),
            top_p: None,
            stop: None,
        }
    }
}

/// Everything a provider needs to generate one brief.
#[derive(Debug, Clone, Copy)]
pub struct BriefRequest<'a> {
    pub map_id: &'a MapId,
    pub topic: &'a Topic,
    pub business: &'a BusinessContext,
}

/// Brief provider client trait
#[async_trait]
pub trait BriefProvider: Send + Sync {
    /// Generate a brief for one topic. This is the single remote call per
    /// work item.
    async fn generate(&self, request: BriefRequest<'_>) -> Result<GeneratedBrief, BriefError>;

    /// Get the provider name
    fn provider_name(&self) -> &str;

    /// Get the model name
    fn model_name(&self) -> &str;
}

const SYSTEM_PROMPT: &str = "You are a content strategist producing structured article briefs. \
Respond with a single JSON object and nothing else. Fields: \
\"title\" (string), \"slug\" (string), \"meta_description\" (string, max 160 chars), \
\"headings\" (array of strings), \"key_points\" (array of strings), \
\"keywords\" (array of strings), \"faq\" (array of {\"question\",\"answer\"}).";

const USER_TEMPLATE: &str = "Create a content brief for the topic \"{topic}\" \
in the topical map \"{map}\". Site domain: {domain}. Audience: {audience}. \
Tone: {tone}. Write in language: {language}.";

fn build_prompts(request: &BriefRequest<'_>) -> (String, String) {
    let user = sanitize::render_template(
        USER_TEMPLATE,
        &[
            ("topic", request.topic.title.as_str()),
            ("map", request.map_id.as_str()),
            ("domain", request.business.domain.as_str()),
            ("audience", request.business.audience.as_str()),
            ("tone", request.business.tone.as_str()),
            ("language", request.business.language.as_str()),
        ],
    );
    (SYSTEM_PROMPT.to_string(), user)
}

/// Payload shape models are asked to return.
#[derive(Debug, Deserialize)]
struct RawBrief {
    title: String,
    #[serde(default)]
    slug: String,
    #[serde(default)]
    meta_description: String,
    #[serde(default)]
    headings: Vec<String>,
    #[serde(default)]
    key_points: Value,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    faq: Vec<FaqEntry>,
}

/// Parse a model response into a brief. Tolerates markdown code fences
/// around the JSON object; anything else is an invalid payload.
fn parse_brief_payload(
    content: &str,
    provider: &str,
    model: &str,
) -> Result<GeneratedBrief, BriefError> {
    let body = strip_code_fences(content);
    let raw: RawBrief = serde_json::from_str(body).map_err(|e| {
        BriefError::InvalidBriefPayload(format!("response is not a valid brief object: {}", e))
    })?;
    Ok(GeneratedBrief {
        title: raw.title,
        slug: raw.slug,
        meta_description: raw.meta_description,
        headings: raw.headings,
        key_points: raw.key_points,
        keywords: raw.keywords,
        faq: raw.faq,
        provider: provider.to_string(),
        model: model.to_string(),
    })
}

fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

// Helper function to convert MessageRole to string
fn role_to_string(role: MessageRole) -> &'static str {
    match role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    }
}

// Helper function to map HTTP errors to BriefError
fn map_http_error(error: reqwest::Error) -> BriefError {
    if error.is_status() {
        let status = error.status().unwrap();
        match status.as_u16() {
            401 => BriefError::ProviderAuthFailed(format!("Authentication failed: {}", error)),
            429 => BriefError::ProviderRateLimit(format!("Rate limit exceeded: {}", error)),
            404 => BriefError::ProviderModelNotFound(format!("Model not found: {}", error)),
            _ => BriefError::ProviderRequestFailed(format!(
                "Request failed with status {}: {}",
                status, error
            )),
        }
    } else if error.is_timeout() {
        BriefError::ProviderRequestFailed(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        BriefError::ProviderRequestFailed(format!("Connection error: {}", error))
    } else {
        BriefError::ProviderError(format!("HTTP error: {}", error))
    }
}

const PROVIDER_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const PROVIDER_HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

fn build_provider_http_client() -> Result<Client, BriefError> {
    Client::builder()
        .connect_timeout(PROVIDER_HTTP_CONNECT_TIMEOUT)
        .timeout(PROVIDER_HTTP_REQUEST_TIMEOUT)
        .build()
        .map_err(|e| BriefError::ProviderError(format!("Failed to create HTTP client: {}", e)))
}

// OpenAI-compatible API request/response structures
#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    model: String,
    choices: Vec<Choice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: OpenAIMessage,
}

#[derive(Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// Client for OpenAI-compatible chat-completion endpoints, including
/// self-hosted ones.
pub struct OpenAiBriefClient {
    client: Client,
    name: String,
    model: String,
    api_key: Option<String>,
    base_url: String,
    options: CompletionOptions,
}

impl OpenAiBriefClient {
    pub fn new(
        name: String,
        model: String,
        api_key: Option<String>,
        base_url: Option<String>,
        options: CompletionOptions,
    ) -> Result<Self, BriefError> {
        let client = build_provider_http_client()?;
        let base_url = base_url.unwrap_or_else(|| "https://api.openai.com/v1".to_string());
        Ok(Self {
            client,
            name,
            model,
            api_key,
            base_url,
            options,
        })
    }
}

#[async_trait]
impl BriefProvider for OpenAiBriefClient {
    async fn generate(&self, request: BriefRequest<'_>) -> Result<GeneratedBrief, BriefError> {
        let (system_prompt, user_prompt) = build_prompts(&request);
        let options = self.options.clone();

        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                OpenAIMessage {
                    role: role_to_string(MessageRole::System).to_string(),
                    content: system_prompt,
                },
                OpenAIMessage {
                    role: role_to_string(MessageRole::User).to_string(),
                    content: user_prompt,
                },
            ],
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            top_p: options.top_p,
            stop: options.stop,
            stream: false,
        };

        let mut http_request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if let Some(api_key) = &self.api_key {
            http_request = http_request.bearer_auth(api_key);
        }

        let response = http_request
            .send()
            .await
            .map_err(map_http_error)?
            .error_for_status()
            .map_err(map_http_error)?;

        let parsed: ChatCompletionResponse = response.json().await.map_err(map_http_error)?;
        if let Some(usage) = &parsed.usage {
            debug!(
                topic = %request.topic.id,
                model = %parsed.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "completion received"
            );
        }
        let choice = parsed.choices.into_iter().next().ok_or_else(|| {
            BriefError::ProviderError("Response contained no choices".to_string())
        })?;

        parse_brief_payload(&choice.message.content, &self.name, &self.model)
    }

    fn provider_name(&self) -> &str {
        &self.name
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

// Anthropic Messages API request/response structures
#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Serialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    model: String,
    content: Vec<AnthropicContent>,
    usage: Option<AnthropicUsage>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Client for the Anthropic Messages API.
pub struct AnthropicBriefClient {
    client: Client,
    name: String,
    model: String,
    api_key: String,
    base_url: String,
    options: CompletionOptions,
}

impl AnthropicBriefClient {
    const API_VERSION: &'static str = "2023-06-01";

    pub fn new(
        name: String,
        model: String,
        api_key: String,
        options: CompletionOptions,
    ) -> Result<Self, BriefError> {
        let client = build_provider_http_client()?;
        Ok(Self {
            client,
            name,
            model,
            api_key,
            base_url: "https://api.anthropic.com".to_string(),
            options,
        })
    }
}

#[async_trait]
impl BriefProvider for AnthropicBriefClient {
    async fn generate(&self, request: BriefRequest<'_>) -> Result<GeneratedBrief, BriefError> {
        let (system_prompt, user_prompt) = build_prompts(&request);
        let options = self.options.clone();

        let body = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: options.max_tokens.unwrap_or(2048),
            system: system_prompt,
            messages: vec![AnthropicMessage {
                role: role_to_string(MessageRole::User).to_string(),
                content: user_prompt,
            }],
            temperature: options.temperature,
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", Self::API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(map_http_error)?
            .error_for_status()
            .map_err(map_http_error)?;

        let parsed: AnthropicResponse = response.json().await.map_err(map_http_error)?;
        if let Some(usage) = &parsed.usage {
            debug!(
                topic = %request.topic.id,
                model = %parsed.model,
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "completion received"
            );
        }
        let text = parsed
            .content
            .into_iter()
            .map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");
        if text.is_empty() {
            return Err(BriefError::ProviderError(
                "Response contained no text content".to_string(),
            ));
        }

        parse_brief_payload(&text, &self.name, &self.model)
    }

    fn provider_name(&self) -> &str {
        &self.name
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
