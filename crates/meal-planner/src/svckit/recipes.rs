//! Recipe Tools
//!
//! `list_recipes`, `get_recipe` and `create_recipe`.

use serde_json::{json, Value};

use super::GetRecipeArgs;
use crate::error::{MealError, Result};
use crate::model::{find_recipe, RecipeDraft};
use crate::store::MealStore;

pub(super) async fn list_recipes(store: &dyn MealStore) -> Result<Value> {
    let recipes = store.recipes().await?;
    let summaries: Vec<Value> = recipes
        .iter()
        .map(|r| json!({ "name": r.name, "description": r.description }))
        .collect();
    Ok(Value::Array(summaries))
}

pub(super) async fn get_recipe(store: &dyn MealStore, args: &GetRecipeArgs) -> Result<Value> {
    let recipe = store.find_recipe(&args.name).await?;
    Ok(json!({
        "name": recipe.name,
        "description": recipe.description,
        "ingredients": recipe.ingredients,
        "body": recipe.body,
    }))
}

pub(super) async fn create_recipe(store: &dyn MealStore, draft: &RecipeDraft) -> Result<Value> {
    if draft.name.trim().is_empty() {
        return Err(MealError::InvalidRecipe("name must not be empty".into()));
    }

    let existing = store.recipes().await?;
    if let Some(recipe) = find_recipe(&existing, &draft.name) {
        return Err(MealError::RecipeExists(recipe.name.clone()));
    }

    let recipe = store.create_recipe(draft).await?;
    Ok(json!({
        "created": recipe.name,
        "ingredients": recipe.ingredients.len(),
    }))
}
