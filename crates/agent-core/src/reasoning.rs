//! Reasoning Loop
//!
//! Bounded tool-use loop, written as an explicit state machine:
//!
//! ```text
//!   AwaitingModel ──text──────────────▶ Done
//!        │  ▲
//!   tool │  │ results appended
//!  calls ▼  │
//!   ExecutingTools
//!
//!   AwaitingModel with the round cap spent ──▶ Aborted
//! ```
//!
//! One round is one request/response cycle with the provider. Tool calls of a
//! round run sequentially, in the order the model asked for them. Dropping the
//! future between rounds abandons the interaction; side effects of tools that
//! already ran are not rolled back.

use std::sync::Arc;

use serde::Serialize;

use crate::error::{AgentError, Result};
use crate::message::{Conversation, Message, Role};
use crate::provider::{GenerationOptions, LlmProvider};
use crate::tool::{ToolCall, ToolRegistry, ToolResult, describe_tools};

/// Default number of model rounds per interaction
pub const DEFAULT_MAX_ROUNDS: usize = 5;

const EMPTY_ANSWER: &str = "I'm not sure how to help with that.";
const ROUND_CAP_NOTICE: &str = "I've been working on this for a while and had to stop before finishing.";

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// System prompt
    pub system_prompt: String,

    /// Maximum model rounds before the loop is aborted
    pub max_rounds: usize,

    /// Generation options
    pub generation: GenerationOptions,

    /// Whether to append tool descriptions to system prompt
    pub inject_tool_descriptions: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_rounds: DEFAULT_MAX_ROUNDS,
            generation: GenerationOptions::default(),
            inject_tool_descriptions: true,
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.

Use the declared tools whenever they can answer the request.
After receiving tool results, synthesize them into a helpful response.
Be concise and accurate.";

/// Loop states
#[derive(Clone, Debug)]
pub enum LoopState {
    /// Waiting for the provider's next response
    AwaitingModel,
    /// Dispatching the tool calls of the last response
    ExecutingTools(Vec<ToolCall>),
    /// Final text answer received
    Done(String),
    /// Round cap reached without a final answer
    Aborted,
}

/// How an interaction ended
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// The model produced a final text answer
    Answered,
    /// The round cap was hit; the reply is a best-effort summary
    RoundCapExceeded { rounds: usize },
}

/// Reply produced by one interaction
#[derive(Clone, Debug, Serialize)]
pub struct AgentReply {
    /// Text for the user
    pub text: String,

    /// How the loop ended
    pub outcome: Outcome,

    /// Model rounds used
    pub rounds: usize,

    /// Tool results produced, in execution order
    #[serde(skip)]
    pub tool_results: Vec<ToolResult>,
}

impl AgentReply {
    pub fn aborted(&self) -> bool {
        matches!(self.outcome, Outcome::RoundCapExceeded { .. })
    }
}

/// The main Agent struct
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<dyn ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<dyn ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    /// Build the system prompt: capability description, tools, current context
    async fn build_system_prompt(&self) -> String {
        let mut prompt = self.config.system_prompt.clone();

        if self.config.inject_tool_descriptions {
            let schemas = self.tools.schemas();
            if !schemas.is_empty() {
                prompt.push_str("\n\n");
                prompt.push_str(&describe_tools(&schemas));
            }
        }

        match self.tools.context().await {
            Ok(Some(context)) => {
                prompt.push_str("\n\n## Current Context\n\n");
                prompt.push_str(&context);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Could not load context, continuing without it");
            }
        }

        prompt
    }

    /// Answer a single user message in a fresh conversation
    pub async fn ask(&self, user_message: &str) -> Result<AgentReply> {
        let mut conversation = Conversation::with_system_prompt(self.build_system_prompt().await);
        conversation.push(Message::user(user_message));
        self.run(&mut conversation).await
    }

    /// Drive the loop over an already seeded conversation
    ///
    /// Only provider errors are returned as `Err`; tool failures are fed back
    /// to the model as tool results.
    pub async fn run(&self, conversation: &mut Conversation) -> Result<AgentReply> {
        if conversation.messages().first().map(|m| &m.role) != Some(&Role::System) {
            let prompt = self.build_system_prompt().await;
            conversation.messages_mut().insert(0, Message::system(prompt));
        }

        let schemas = self.tools.schemas();
        let mut state = LoopState::AwaitingModel;
        let mut rounds = 0;
        let mut partial_text = String::new();
        let mut tool_results = Vec::new();

        loop {
            state = match state {
                LoopState::AwaitingModel if rounds >= self.config.max_rounds => LoopState::Aborted,
                LoopState::AwaitingModel => {
                    rounds += 1;
                    tracing::debug!(round = rounds, messages = conversation.len(), "Awaiting model");

                    let completion = self
                        .provider
                        .complete(conversation.messages(), &schemas, &self.config.generation)
                        .await?;

                    if completion.wants_tools() {
                        let calls: Vec<ToolCall> = completion
                            .tool_calls
                            .into_iter()
                            .map(ensure_call_id)
                            .collect();
                        if !completion.content.trim().is_empty() {
                            partial_text.clone_from(&completion.content);
                        }
                        conversation.push(Message::assistant_with_tools(
                            completion.content,
                            calls.clone(),
                        ));
                        LoopState::ExecutingTools(calls)
                    } else {
                        conversation.push(Message::assistant(&completion.content));
                        LoopState::Done(completion.content)
                    }
                }
                LoopState::ExecutingTools(calls) => {
                    for call in &calls {
                        let result = self.execute_tool(call).await;
                        conversation.push(Message::tool_result(&result));
                        tool_results.push(result);
                    }
                    LoopState::AwaitingModel
                }
                LoopState::Done(text) => {
                    let text = if text.trim().is_empty() {
                        EMPTY_ANSWER.to_string()
                    } else {
                        text
                    };
                    return Ok(AgentReply {
                        text,
                        outcome: Outcome::Answered,
                        rounds,
                        tool_results,
                    });
                }
                LoopState::Aborted => {
                    tracing::warn!(rounds, "Round cap reached, returning partial reply");
                    return Ok(AgentReply {
                        text: partial_reply(&partial_text, &tool_results),
                        outcome: Outcome::RoundCapExceeded { rounds },
                        rounds,
                        tool_results,
                    });
                }
            };
        }
    }

    /// Validate and execute one tool call; never fails
    async fn execute_tool(&self, call: &ToolCall) -> ToolResult {
        tracing::debug!(tool = %call.name, "Executing tool");

        let outcome = match self.tools.validate(call) {
            Ok(()) => self.tools.execute(call).await,
            Err(e) => Err(e),
        };

        let mut result = match outcome {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(tool = %call.name, error = %e, "Tool failed");
                ToolResult::failure(call.name.clone(), e.to_string())
            }
        };
        result.id.clone_from(&call.id);
        result
    }

    /// Get the tool registry
    pub fn tools(&self) -> &dyn ToolRegistry {
        self.tools.as_ref()
    }

    /// Get configuration
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }
}

fn ensure_call_id(mut call: ToolCall) -> ToolCall {
    if call.id.is_none() {
        call.id = Some(uuid::Uuid::new_v4().to_string());
    }
    call
}

fn partial_reply(partial_text: &str, results: &[ToolResult]) -> String {
    let mut reply = String::from(ROUND_CAP_NOTICE);

    let done: Vec<&str> = results
        .iter()
        .filter(|r| r.success)
        .map(|r| r.name.as_str())
        .collect();
    if !done.is_empty() {
        reply.push_str(&format!("\nCompleted steps: {}.", done.join(", ")));
    }

    if !partial_text.trim().is_empty() {
        reply.push_str("\n\n");
        reply.push_str(partial_text.trim());
    }

    reply
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: Option<Arc<dyn ToolRegistry>>,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: None,
            config: AgentConfig::default(),
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn tools(mut self, tools: Arc<dyn ToolRegistry>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    pub const fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    pub const fn max_rounds(mut self, max: usize) -> Self {
        self.config.max_rounds = max;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;
        let tools = self
            .tools
            .ok_or_else(|| AgentError::Config("Tool registry is required".into()))?;
        if self.config.max_rounds == 0 {
            return Err(AgentError::Config("max_rounds must be at least 1".into()));
        }

        Ok(Agent::new(provider, tools, self.config))
    }
}
