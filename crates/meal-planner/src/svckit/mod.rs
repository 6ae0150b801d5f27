//! Service Kit - Agent Tools
//!
//! The closed set of meal planning tools. Each tool is a [`MealTool`] variant
//! carrying typed arguments; [`MealToolRegistry`] exposes them to the agent
//! through `agent_core::ToolRegistry`.

mod plans;
mod recipes;
mod shopping_list;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;
use serde_json::Value;

use agent_core::{
    AgentError, ParameterSchema, Result as CoreResult, ToolCall, ToolRegistry, ToolResult,
    ToolSchema,
};

use crate::error::Result;
use crate::model::RecipeDraft;
use crate::planner::PlannerSettings;
use crate::store::MealStore;

/// Names of the tools the agent may call
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToolName {
    ListRecipes,
    GetRecipe,
    CreateRecipe,
    GetCurrentPlan,
    PlanWeek,
    SwapMeal,
    GetShoppingList,
}

impl ToolName {
    pub const ALL: [Self; 7] = [
        Self::ListRecipes,
        Self::GetRecipe,
        Self::CreateRecipe,
        Self::GetCurrentPlan,
        Self::PlanWeek,
        Self::SwapMeal,
        Self::GetShoppingList,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ListRecipes => "list_recipes",
            Self::GetRecipe => "get_recipe",
            Self::CreateRecipe => "create_recipe",
            Self::GetCurrentPlan => "get_current_plan",
            Self::PlanWeek => "plan_week",
            Self::SwapMeal => "swap_meal",
            Self::GetShoppingList => "get_shopping_list",
        }
    }

    /// Look up a tool by the name the model used (`swap` is accepted for `swap_meal`)
    pub fn parse(name: &str) -> Option<Self> {
        if name == "swap" {
            return Some(Self::SwapMeal);
        }
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    pub fn schema(self) -> ToolSchema {
        let (description, parameters, has_side_effects) = match self {
            Self::ListRecipes => (
                "List all recipes with names and descriptions.",
                vec![],
                false,
            ),
            Self::GetRecipe => (
                "Get full details of a recipe by name, including ingredients and instructions.",
                vec![ParameterSchema::string("name", "Recipe name").required()],
                false,
            ),
            Self::CreateRecipe => (
                "Create a new recipe. Check existing recipes first to avoid duplicates.",
                vec![
                    ParameterSchema::string("name", "Recipe name").required(),
                    ParameterSchema::string("description", "Short description"),
                    ParameterSchema::string_array("ingredients", "Ingredient lines, e.g. '2 cups rice'")
                        .required(),
                    ParameterSchema::string_array("instructions", "Steps in order").required(),
                ],
                true,
            ),
            Self::GetCurrentPlan => (
                "Get this week's day-by-day dinner plan.",
                vec![],
                false,
            ),
            Self::PlanWeek => (
                "Generate a new random 7-day dinner plan for this week, avoiding recipes from recent weeks. Replaces this week's plan.",
                vec![ParameterSchema::string_array("exclude", "Recipe names to leave out")],
                true,
            ),
            Self::SwapMeal => (
                "Replace one day's dinner in this week's plan, with a specific recipe or a random one.",
                vec![
                    ParameterSchema::string("day", "Day name (e.g. Monday, tue)").required(),
                    ParameterSchema::string("recipe_name", "Optional: specific recipe to use"),
                    ParameterSchema::string_array("exclude", "Recipe names not to pick"),
                ],
                true,
            ),
            Self::GetShoppingList => (
                "Get an aggregated shopping list for this week's plan.",
                vec![],
                false,
            ),
        };

        ToolSchema {
            name: self.as_str().into(),
            description: description.into(),
            parameters,
            has_side_effects,
        }
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct GetRecipeArgs {
    pub name: String,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PlanWeekArgs {
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SwapMealArgs {
    pub day: String,
    #[serde(default)]
    pub recipe_name: Option<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl SwapMealArgs {
    /// Requested recipe, ignoring blank names
    pub fn requested(&self) -> Option<&str> {
        self.recipe_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}

/// A validated tool invocation
#[derive(Clone, Debug)]
pub enum MealTool {
    ListRecipes,
    GetRecipe(GetRecipeArgs),
    CreateRecipe(RecipeDraft),
    GetCurrentPlan,
    PlanWeek(PlanWeekArgs),
    SwapMeal(SwapMealArgs),
    GetShoppingList,
}

impl MealTool {
    pub const fn name(&self) -> ToolName {
        match self {
            Self::ListRecipes => ToolName::ListRecipes,
            Self::GetRecipe(_) => ToolName::GetRecipe,
            Self::CreateRecipe(_) => ToolName::CreateRecipe,
            Self::GetCurrentPlan => ToolName::GetCurrentPlan,
            Self::PlanWeek(_) => ToolName::PlanWeek,
            Self::SwapMeal(_) => ToolName::SwapMeal,
            Self::GetShoppingList => ToolName::GetShoppingList,
        }
    }
}

impl TryFrom<&ToolCall> for MealTool {
    type Error = AgentError;

    fn try_from(call: &ToolCall) -> std::result::Result<Self, Self::Error> {
        let name = ToolName::parse(&call.name)
            .ok_or_else(|| AgentError::ToolNotFound(call.name.clone()))?;
        name.schema().validate(call)?;

        // Explicit nulls count as absent
        let args = Value::Object(
            call.arguments
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        );

        let tool = match name {
            ToolName::ListRecipes => Self::ListRecipes,
            ToolName::GetRecipe => Self::GetRecipe(parse_args(name, args)?),
            ToolName::CreateRecipe => Self::CreateRecipe(parse_args(name, args)?),
            ToolName::GetCurrentPlan => Self::GetCurrentPlan,
            ToolName::PlanWeek => Self::PlanWeek(parse_args(name, args)?),
            ToolName::SwapMeal => Self::SwapMeal(parse_args(name, args)?),
            ToolName::GetShoppingList => Self::GetShoppingList,
        };
        Ok(tool)
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(name: ToolName, args: Value) -> CoreResult<T> {
    serde_json::from_value(args)
        .map_err(|e| AgentError::ToolValidation(format!("Invalid arguments for {name}: {e}")))
}

/// Tool registry over a meal store
pub struct MealToolRegistry {
    store: Arc<dyn MealStore>,
    settings: PlannerSettings,
    today: Option<NaiveDate>,
    seed: Option<u64>,
}

impl MealToolRegistry {
    pub fn new(store: Arc<dyn MealStore>, settings: PlannerSettings) -> Self {
        Self {
            store,
            settings,
            today: None,
            seed: None,
        }
    }

    /// Pin the current date (defaults to the local date at call time)
    pub const fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Seed the planner's random choices
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    fn rng(&self) -> StdRng {
        self.seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
    }

    /// Run a tool against the store
    pub async fn dispatch(&self, tool: MealTool) -> Result<Value> {
        let store = self.store.as_ref();
        let today = self.today();

        match tool {
            MealTool::ListRecipes => recipes::list_recipes(store).await,
            MealTool::GetRecipe(args) => recipes::get_recipe(store, &args).await,
            MealTool::CreateRecipe(draft) => recipes::create_recipe(store, &draft).await,
            MealTool::GetCurrentPlan => plans::get_current_plan(store, today).await,
            MealTool::PlanWeek(args) => {
                let mut rng = self.rng();
                plans::plan_week(store, &mut rng, today, &self.settings, &args).await
            }
            MealTool::SwapMeal(args) => {
                let mut rng = self.rng();
                plans::swap_meal(store, &mut rng, today, &args).await
            }
            MealTool::GetShoppingList => shopping_list::get_shopping_list(store, today).await,
        }
    }
}

#[async_trait]
impl ToolRegistry for MealToolRegistry {
    fn schemas(&self) -> Vec<ToolSchema> {
        ToolName::ALL.into_iter().map(ToolName::schema).collect()
    }

    fn validate(&self, call: &ToolCall) -> CoreResult<()> {
        MealTool::try_from(call).map(|_| ())
    }

    /// Unknown or malformed calls are returned as errors; handler failures
    /// become failed results
    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let tool = MealTool::try_from(call)?;
        let name = tool.name();
        tracing::debug!(tool = %name, "Dispatching tool");

        match self.dispatch(tool).await {
            Ok(data) => Ok(ToolResult::json(name.as_str(), data)),
            Err(e) => {
                tracing::warn!(tool = %name, error = %e, "Tool failed");
                Ok(ToolResult::failure(name.as_str(), e.to_string()))
            }
        }
    }

    async fn context(&self) -> CoreResult<Option<String>> {
        plans::context_snapshot(self.store.as_ref(), self.today())
            .await
            .map(Some)
            .map_err(|e| AgentError::ToolExecution(e.to_string()))
    }
}
