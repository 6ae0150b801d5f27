//! Server Configuration
//!
//! Read once from the environment at startup and never changed afterwards.

use std::collections::HashSet;

use agent_core::reasoning::DEFAULT_MAX_ROUNDS;
use agent_runtime::AnthropicConfig;
use meal_planner::{PlannerSettings, StoreConfig};
use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error(transparent)]
    Store(#[from] meal_planner::MealError),

    #[error(transparent)]
    Provider(#[from] agent_core::AgentError),
}

/// Caller ids allowed to talk to the agent; empty admits everyone
#[derive(Clone, Debug, Default)]
pub struct AllowList {
    ids: HashSet<String>,
}

impl AllowList {
    /// Comma-separated ids
    pub fn parse(raw: &str) -> Self {
        Self {
            ids: raw
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn allows(&self, caller_id: &str) -> bool {
        self.ids.is_empty() || self.ids.contains(caller_id.trim())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub model: String,
    pub max_rounds: usize,
    pub allowed_users: AllowList,
    pub store: StoreConfig,
    pub planner: PlannerSettings,
    pub anthropic: AnthropicConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let max_rounds = match std::env::var("MAX_TOOL_ROUNDS") {
            Ok(raw) => parse_rounds(&raw)?,
            Err(_) => DEFAULT_MAX_ROUNDS,
        };

        Ok(Self {
            bind_addr: env_or("BIND_ADDR", DEFAULT_BIND_ADDR),
            model: env_or("ANTHROPIC_MODEL", DEFAULT_MODEL),
            max_rounds,
            allowed_users: AllowList::parse(&std::env::var("ALLOWED_USERS").unwrap_or_default()),
            store: StoreConfig::from_env()?,
            planner: PlannerSettings::from_env()?,
            anthropic: AnthropicConfig::from_env()?,
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_rounds(raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(rounds) if rounds > 0 => Ok(rounds),
        _ => Err(ConfigError::Invalid {
            name: "MAX_TOOL_ROUNDS",
            expected: "a positive number",
            value: raw.to_string(),
        }),
    }
}
