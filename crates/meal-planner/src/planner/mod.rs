//! Planning Engine
//!
//! Pure functions over recipes and plans. Randomness comes in through an
//! explicit `Rng` so results are reproducible under a seed.

pub mod markdown;
mod shopping;
mod week;

pub use shopping::{aggregate_ingredients, ShoppingList};
pub use week::{
    assign_day, generate_week_plan, parse_plan_name, plan_name_for, recent_recipe_names,
    swap_day, week_monday,
};

use serde::{Deserialize, Serialize};

use crate::error::{MealError, Result};

/// Number of past plans whose recipes `plan_week` avoids
pub const DEFAULT_HISTORY_WINDOW: usize = 2;

/// Planner settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlannerSettings {
    /// Recent-history lookback, in plans
    pub history_window: usize,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        Self {
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }
}

impl PlannerSettings {
    /// Read optional `PLAN_HISTORY_WINDOW`
    pub fn from_env() -> Result<Self> {
        let mut settings = Self::default();
        if let Ok(raw) = std::env::var("PLAN_HISTORY_WINDOW") {
            settings.history_window = raw.trim().parse().map_err(|_| {
                MealError::Config(format!("PLAN_HISTORY_WINDOW must be a number, got '{raw}'"))
            })?;
        }
        Ok(settings)
    }

    pub const fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }
}
