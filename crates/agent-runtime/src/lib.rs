//! # agent-runtime
//!
//! Runtime providers for the meal agent.
//!
//! ## Providers
//!
//! - **Anthropic** (default): Messages API with native tool use
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::{AnthropicConfig, AnthropicProvider};
//!
//! let provider = AnthropicProvider::from_config(AnthropicConfig::from_env()?)?;
//! let agent = AgentBuilder::new()
//!     .provider(Arc::new(provider))
//!     .tools(registry)
//!     .build()?;
//! ```

#[cfg(feature = "anthropic")]
pub mod anthropic;

#[cfg(feature = "anthropic")]
pub use anthropic::{AnthropicConfig, AnthropicProvider};

// Re-export core types for convenience
pub use agent_core::{
    Agent, AgentError, LlmProvider, Message, Result, Role, ToolRegistry,
};
