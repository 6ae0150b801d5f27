//! Error Types for the Meal Planner

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MealError>;

/// Failures talking to the remote store
///
/// Never retried by the client; callers decide.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Network failure or timeout before a response arrived
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    /// 2xx response whose body did not have the expected shape
    #[error("Unexpected response: {0}")]
    Decode(String),
}

impl StoreError {
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Planning engine failures
#[derive(Error, Debug, PartialEq, Eq)]
pub enum PlannerError {
    #[error("Unknown day: {0}")]
    InvalidDay(String),

    #[error("No recipes found")]
    NoRecipes,
}

#[derive(Error, Debug)]
pub enum MealError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Planner(#[from] PlannerError),

    #[error("Recipe '{0}' not found")]
    RecipeNotFound(String),

    #[error("Recipe '{0}' already exists")]
    RecipeExists(String),

    #[error("Invalid recipe: {0}")]
    InvalidRecipe(String),

    #[error("No plan for this week")]
    NoCurrentPlan,

    #[error("Configuration error: {0}")]
    Config(String),
}
