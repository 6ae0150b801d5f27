//! Meal Data Store
//!
//! Repository over recipes and weekly plans. [`AnytypeStore`] talks to the
//! Anytype API through the rate-limited [`AnytypeClient`]; [`MemoryStore`]
//! keeps everything in process for tests and demos.

mod anytype;
mod client;
mod limiter;
mod memory;

pub use anytype::AnytypeStore;
pub use client::{AnytypeClient, Icon, NewObject, StoreConfig, API_VERSION, DEFAULT_API_URL};
pub use limiter::{RateLimiter, ANYTYPE_BURST, ANYTYPE_REFILL_PER_SEC};
pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::{MealError, Result};
use crate::model::{find_recipe, PlanHeader, Recipe, RecipeDraft, StoredPlan};

/// Meal store trait (Repository pattern)
///
/// Implement this for each backing store.
#[async_trait]
pub trait MealStore: Send + Sync {
    /// All recipes; bodies may be missing until [`MealStore::load_recipe`]
    async fn recipes(&self) -> Result<Vec<Recipe>>;

    /// Recipe with its body
    async fn load_recipe(&self, recipe: &Recipe) -> Result<Recipe> {
        Ok(recipe.clone())
    }

    /// Every stored plan, newest week first
    async fn plan_headers(&self) -> Result<Vec<PlanHeader>>;

    /// Plan with its day assignments
    async fn load_plan(&self, header: &PlanHeader) -> Result<StoredPlan>;

    /// Persist a new recipe
    async fn create_recipe(&self, draft: &RecipeDraft) -> Result<Recipe>;

    /// Create the plan, or replace its body when it already has an id
    async fn save_plan(&self, plan: &StoredPlan) -> Result<StoredPlan>;

    /// Store name
    fn name(&self) -> &str;

    /// Case-insensitive lookup, body included
    async fn find_recipe(&self, name: &str) -> Result<Recipe> {
        let recipes = self.recipes().await?;
        let recipe = find_recipe(&recipes, name)
            .ok_or_else(|| MealError::RecipeNotFound(name.trim().to_string()))?;
        self.load_recipe(recipe).await
    }

    /// Plan for the week starting at `monday`, if any
    async fn plan_for_week(&self, monday: NaiveDate) -> Result<Option<StoredPlan>> {
        let headers = self.plan_headers().await?;
        match headers.iter().find(|h| h.week_of == monday) {
            Some(header) => Ok(Some(self.load_plan(header).await?)),
            None => Ok(None),
        }
    }

    /// Up to `window` plans for weeks before `monday`, newest first
    async fn plans_before(&self, monday: NaiveDate, window: usize) -> Result<Vec<StoredPlan>> {
        let headers = self.plan_headers().await?;
        let mut plans = Vec::new();
        for header in headers.iter().filter(|h| h.week_of < monday).take(window) {
            plans.push(self.load_plan(header).await?);
        }
        Ok(plans)
    }
}

/// Newest week first; one header per week
pub(crate) fn sort_headers(mut headers: Vec<PlanHeader>) -> Vec<PlanHeader> {
    headers.sort_by(|a, b| b.week_of.cmp(&a.week_of));
    headers.dedup_by(|a, b| a.week_of == b.week_of);
    headers
}
