//! # meal-planner
//!
//! Household meal planning over recipes and weekly dinner plans kept in an
//! Anytype space.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  svckit     MealToolRegistry: closed set of agent tools     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  planner    weekly plans, swaps, shopping list (pure)       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  store      MealStore: AnytypeStore | MemoryStore           │
//! │             AnytypeClient ── RateLimiter (60 burst, 1/s)    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Planning rules
//!
//! - One dinner per day, Monday to Sunday
//! - Recipes from the most recent plans are avoided while alternatives remain
//! - Fewer than seven candidates: each is used once, the rest are repeats
//! - The shopping list merges ingredients case-insensitively, first spelling wins

pub mod error;
pub mod model;
pub mod planner;
pub mod store;
pub mod svckit;

use chrono::NaiveDate;

pub use error::{MealError, PlannerError, Result, StoreError};
pub use model::{Day, MealPlan, Recipe, RecipeDraft, StoredPlan};
pub use planner::{PlannerSettings, ShoppingList};
pub use store::{AnytypeClient, AnytypeStore, MealStore, MemoryStore, RateLimiter, StoreConfig};
pub use svckit::{MealTool, MealToolRegistry, ToolName};

/// System prompt for the meal planning agent
pub const MEAL_PLANNER_PROMPT: &str = r"You are a meal planning assistant for a household. You manage recipes and weekly dinner plans stored in Anytype.

## Guidelines

1. Check existing recipes before creating new ones
2. Use `plan_week` for a fresh week; it already avoids recipes from recent weeks
3. Use `swap_meal` to change a single day instead of replanning the whole week
4. Build shopping lists with `get_shopping_list`, never from memory
5. Keep responses concise and friendly";

/// System prompt with the current date appended
pub fn system_prompt(today: NaiveDate) -> String {
    format!("{MEAL_PLANNER_PROMPT}\n\nCurrent date: {}", today.format("%Y-%m-%d (%A)"))
}
