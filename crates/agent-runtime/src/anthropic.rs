//! Anthropic LLM Provider
//!
//! Implementation of `LlmProvider` for the Anthropic Messages API with native
//! tool use (`tool_use` / `tool_result` content blocks).

use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{Completion, FinishReason, GenerationOptions, LlmProvider, ProviderInfo, TokenUsage},
    tool::{ToolCall, ToolSchema},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Anthropic provider configuration
#[derive(Clone, Debug)]
pub struct AnthropicConfig {
    /// API key (`x-api-key`)
    pub api_key: String,

    /// Base URL, without the `/v1` suffix
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl AnthropicConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            timeout_secs: 120,
        }
    }

    /// Read `ANTHROPIC_API_KEY` and optional `ANTHROPIC_BASE_URL`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| AgentError::Config("ANTHROPIC_API_KEY is not set".into()))?;
        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var("ANTHROPIC_BASE_URL") {
            config.base_url = base_url;
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Anthropic LLM provider
pub struct AnthropicProvider {
    client: reqwest::Client,
    config: AnthropicConfig,
}

impl AnthropicProvider {
    /// Create from configuration
    pub fn from_config(config: AnthropicConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(AnthropicConfig::from_env()?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1{}", self.config.base_url, path)
    }

    /// Split the system prompt off; the API takes it as a top-level field
    fn extract_system(messages: &[Message]) -> (Option<String>, Vec<&Message>) {
        let (system, rest): (Vec<&Message>, Vec<&Message>) =
            messages.iter().partition(|m| m.role == Role::System);

        let system = if system.is_empty() {
            None
        } else {
            Some(
                system
                    .iter()
                    .map(|m| m.content.as_str())
                    .collect::<Vec<_>>()
                    .join("\n\n"),
            )
        };

        (system, rest)
    }

    /// Convert agent messages to API messages
    ///
    /// Consecutive tool results are merged into one user message, which is
    /// what the API expects after an assistant turn with several `tool_use`
    /// blocks.
    fn convert_messages(messages: &[&Message]) -> Vec<ApiMessage> {
        let mut result: Vec<ApiMessage> = Vec::new();

        for msg in messages {
            match msg.role {
                Role::User => result.push(ApiMessage {
                    role: "user",
                    content: ApiContent::Text(msg.content.clone()),
                }),
                Role::Assistant if msg.tool_calls.is_empty() => result.push(ApiMessage {
                    role: "assistant",
                    content: ApiContent::Text(msg.content.clone()),
                }),
                Role::Assistant => {
                    let mut blocks = Vec::new();
                    if !msg.content.trim().is_empty() {
                        blocks.push(ContentBlock::Text { text: msg.content.clone() });
                    }
                    for call in &msg.tool_calls {
                        blocks.push(ContentBlock::ToolUse {
                            id: call.id.clone().unwrap_or_default(),
                            name: call.name.clone(),
                            input: call.arguments_value(),
                        });
                    }
                    result.push(ApiMessage {
                        role: "assistant",
                        content: ApiContent::Blocks(blocks),
                    });
                }
                Role::Tool => {
                    let block = ContentBlock::ToolResult {
                        tool_use_id: msg.tool_call_id().unwrap_or_default().to_string(),
                        content: msg.content.clone(),
                        is_error: msg.is_tool_error(),
                    };
                    match result.last_mut() {
                        Some(ApiMessage { role: "user", content: ApiContent::Blocks(blocks) })
                            if blocks.iter().all(|b| matches!(b, ContentBlock::ToolResult { .. })) =>
                        {
                            blocks.push(block);
                        }
                        _ => result.push(ApiMessage {
                            role: "user",
                            content: ApiContent::Blocks(vec![block]),
                        }),
                    }
                }
                Role::System => {}
            }
        }

        result
    }

    fn convert_tools(tools: &[ToolSchema]) -> Vec<ApiTool> {
        tools
            .iter()
            .map(|t| ApiTool {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: t.input_schema(),
            })
            .collect()
    }

    /// Convert an API response to an agent completion
    fn convert_completion(response: ApiResponse) -> Completion {
        let mut text = String::new();
        let mut tool_calls = Vec::new();

        for block in response.content {
            match block {
                ResponseBlock::Text { text: part } => {
                    if !text.is_empty() {
                        text.push('\n');
                    }
                    text.push_str(&part);
                }
                ResponseBlock::ToolUse { id, name, input } => {
                    let arguments = match input {
                        serde_json::Value::Object(map) => map.into_iter().collect(),
                        _ => std::collections::HashMap::new(),
                    };
                    tool_calls.push(ToolCall { name, arguments, id: Some(id) });
                }
                ResponseBlock::Other => {}
            }
        }

        Completion {
            content: text,
            tool_calls,
            model: response.model,
            usage: Some(TokenUsage {
                prompt_tokens: response.usage.input_tokens,
                completion_tokens: response.usage.output_tokens,
                total_tokens: response.usage.input_tokens + response.usage.output_tokens,
            }),
            finish_reason: response.stop_reason.as_deref().map(FinishReason::from_stop_reason),
        }
    }

    /// Map a non-success HTTP status to an agent error
    fn status_error(status: u16, body: String) -> AgentError {
        match status {
            401 | 403 => AgentError::Auth("Anthropic rejected the API key".into()),
            429 => AgentError::RateLimited(body),
            500..=599 => AgentError::ProviderUnavailable(format!("HTTP {status}: {body}")),
            _ => AgentError::Provider(format!("HTTP {status}: {body}")),
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "Anthropic".into(),
            version: Some(ANTHROPIC_VERSION.into()),
            supports_tools: true,
        }
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(self.url("/models"))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .send()
            .await;

        match response {
            Ok(r) => Ok(r.status().is_success()),
            Err(e) => {
                tracing::warn!("Anthropic health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: &[ToolSchema],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let (system, rest) = Self::extract_system(messages);
        let request = ApiRequest {
            model: &options.model,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            system,
            messages: Self::convert_messages(&rest),
            tools: Self::convert_tools(tools),
            stop_sequences: &options.stop_sequences,
        };

        tracing::debug!(model = %options.model, messages = request.messages.len(), "Sending Anthropic request");

        let response = self
            .client
            .post(self.url("/messages"))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::ProviderUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body = %body, "Anthropic API error");
            return Err(Self::status_error(status.as_u16(), body));
        }

        let body: ApiResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Parse(format!("Failed to parse Anthropic response: {e}")))?;

        Ok(Self::convert_completion(body))
    }
}

// --- Anthropic API types ---

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    stop_sequences: &'a [String],
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: ApiContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ApiContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

#[derive(Debug, Serialize)]
struct ApiTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    model: String,
    content: Vec<ResponseBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    usage: ApiUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    input_tokens: u32,
    output_tokens: u32,
}
