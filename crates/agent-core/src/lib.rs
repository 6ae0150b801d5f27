//! # agent-core
//!
//! Core agent logic with provider-agnostic LLM abstraction and a schema-described
//! tool seam.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Agent                                 │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │  Reasoning  │  │    Tool     │  │   LlmProvider       │  │
//! │  │    Loop     │──│  Registry   │──│   (Strategy)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait hides the reasoning service; the `ToolRegistry`
//! trait hides the domain. The loop itself knows neither.

pub mod provider;
pub mod tool;
pub mod reasoning;
pub mod message;
pub mod error;

pub use error::{AgentError, Result};
pub use message::{Conversation, Message, Role};
pub use provider::{Completion, GenerationOptions, LlmProvider};
pub use reasoning::{Agent, AgentBuilder, AgentConfig, AgentReply, Outcome};
pub use tool::{ParameterSchema, ToolCall, ToolRegistry, ToolResult, ToolSchema};
