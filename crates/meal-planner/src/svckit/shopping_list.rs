//! Shopping List Tool

use chrono::NaiveDate;
use serde_json::{json, Value};

use super::plans::current_plan;
use crate::error::Result;
use crate::model::{find_recipe, Recipe};
use crate::planner::ShoppingList;
use crate::store::MealStore;

pub(super) async fn get_shopping_list(store: &dyn MealStore, today: NaiveDate) -> Result<Value> {
    let plan = current_plan(store, today).await?;
    let recipes = store.recipes().await?;

    let mut planned: Vec<Recipe> = Vec::new();
    let mut missing = Vec::new();
    for name in plan.plan.recipe_names() {
        match find_recipe(&recipes, name) {
            Some(recipe) if !planned.iter().any(|p| p.is_named(name)) => {
                planned.push(store.load_recipe(recipe).await?);
            }
            Some(_) => {}
            None => missing.push(name.to_string()),
        }
    }

    let list = ShoppingList::from_recipes(&planned);
    tracing::debug!(recipes = planned.len(), items = list.len(), "Built shopping list");

    Ok(json!({
        "ingredients": list.ingredients,
        "unknown_recipes": missing,
    }))
}
