//! Application State

use std::sync::Arc;

use agent_core::{
    provider::GenerationOptions,
    reasoning::{Agent, AgentConfig},
    LlmProvider,
};
use meal_planner::MealToolRegistry;

use crate::config::AllowList;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Reasoning service
    pub provider: Arc<dyn LlmProvider>,

    /// Meal planning tools over the configured store
    pub tools: Arc<MealToolRegistry>,

    /// Callers admitted to `/api/chat`
    pub allowed_users: Arc<AllowList>,

    pub model: String,
    pub max_rounds: usize,
}

impl AppState {
    /// Fresh agent for one interaction, prompted with today's date
    ///
    /// Providers with native tool use get the schemas as declarations only,
    /// not repeated as prose in the system prompt.
    pub fn agent(&self) -> Agent {
        let config = AgentConfig {
            system_prompt: meal_planner::system_prompt(self.tools.today()),
            max_rounds: self.max_rounds,
            generation: GenerationOptions {
                model: self.model.clone(),
                ..Default::default()
            },
            inject_tool_descriptions: !self.provider.info().supports_tools,
        };

        Agent::new(Arc::clone(&self.provider), self.tools.clone(), config)
    }
}
