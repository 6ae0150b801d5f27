//! Domain Models
//!
//! Recipes and weekly plans as the planner sees them, plus the wire records
//! returned by the Anytype API.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::PlannerError;
use crate::planner::markdown;

/// Object type key for recipes
pub const RECIPE_TYPE: &str = "recipe";

/// Object type key for meal plans
pub const MEAL_PLAN_TYPE: &str = "meal_plan";

/// Day of the week, Monday first
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub const ALL: [Self; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }

    /// Parse a day label: full name or a prefix of at least three letters,
    /// case-insensitive ("Tuesday", "tue", "TUES").
    pub fn parse(label: &str) -> Result<Self, PlannerError> {
        let key = label.trim().to_lowercase();
        if key.len() >= 3 {
            for day in Self::ALL {
                if day.name().to_lowercase().starts_with(&key) {
                    return Ok(day);
                }
            }
        }
        Err(PlannerError::InvalidDay(label.trim().to_string()))
    }

    /// Calendar date of this day in the week starting at `monday`
    pub fn date_in_week(self, monday: NaiveDate) -> NaiveDate {
        monday + Duration::days(self as i64)
    }
}

impl std::str::FromStr for Day {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Day {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A recipe
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    /// Store object id (None until persisted)
    pub id: Option<String>,

    /// Name, unique within a space
    pub name: String,

    /// Short description
    pub description: String,

    /// Ingredient lines, in recipe order
    pub ingredients: Vec<String>,

    /// Markdown body
    pub body: String,
}

impl Recipe {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: String::new(),
            ingredients: Vec::new(),
            body: String::new(),
        }
    }

    /// Build from a body; ingredients are parsed from it
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self.ingredients = markdown::parse_ingredients(&self.body);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn from_object(object: &StoreObject) -> Self {
        Self::new(&object.name)
            .with_id(&object.id)
            .with_description(object.snippet.clone().unwrap_or_default())
            .with_body(object.markdown.clone().unwrap_or_default())
    }

    pub fn has_body(&self) -> bool {
        !self.body.trim().is_empty()
    }

    /// Case-insensitive name match
    pub fn is_named(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }
}

/// Find a recipe by case-insensitive name
pub fn find_recipe<'a>(recipes: &'a [Recipe], name: &str) -> Option<&'a Recipe> {
    recipes.iter().find(|r| r.is_named(name))
}

/// Input for creating a recipe
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RecipeDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
}

impl RecipeDraft {
    pub fn body(&self) -> String {
        markdown::build_recipe_body(&self.ingredients, &self.instructions)
    }
}

/// A week of dinners: one optional recipe name per day
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealPlan {
    slots: [Option<String>; 7],
}

impl MealPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign names to days in order, Monday first
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut plan = Self::new();
        for (day, name) in Day::ALL.into_iter().zip(names) {
            plan.set(day, Some(name.into()));
        }
        plan
    }

    pub fn get(&self, day: Day) -> Option<&str> {
        self.slots[day.index()].as_deref()
    }

    pub fn set(&mut self, day: Day, recipe: Option<String>) {
        self.slots[day.index()] = recipe;
    }

    /// Every day with its assignment
    pub fn days(&self) -> impl Iterator<Item = (Day, Option<&str>)> {
        Day::ALL.into_iter().map(|day| (day, self.get(day)))
    }

    /// Assigned recipe names, Monday first (repeats included)
    pub fn recipe_names(&self) -> Vec<&str> {
        self.slots.iter().filter_map(|s| s.as_deref()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

/// A plan as persisted in the store, one per week
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredPlan {
    /// Store object id (None until persisted)
    pub id: Option<String>,

    /// Monday of the planned week
    pub week_of: NaiveDate,

    pub plan: MealPlan,
}

impl StoredPlan {
    pub fn name(&self) -> String {
        crate::planner::plan_name_for(self.week_of)
    }

    pub fn body(&self) -> String {
        markdown::build_plan_body(&self.plan, self.week_of)
    }
}

/// Meal plan object without its body
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlanHeader {
    pub id: String,
    pub week_of: NaiveDate,
}

impl PlanHeader {
    /// Plans are identified by their `Week of YYYY-MM-DD` name
    pub fn from_object(object: &StoreObject) -> Option<Self> {
        let week_of = crate::planner::parse_plan_name(&object.name)?;
        Some(Self {
            id: object.id.clone(),
            week_of,
        })
    }
}

// ============================================================================
// Anytype wire records
// ============================================================================

/// Object type reference
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectType {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub name: String,
}

/// A typed record in a space
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreObject {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub snippet: Option<String>,

    /// Full markdown body, when the endpoint includes it
    #[serde(default)]
    pub markdown: Option<String>,

    #[serde(rename = "type", default)]
    pub object_type: Option<ObjectType>,

    #[serde(default)]
    pub space_id: Option<String>,
}

impl StoreObject {
    pub fn type_key(&self) -> Option<&str> {
        self.object_type.as_ref().map(|t| t.key.as_str())
    }

    pub fn is_type(&self, key: &str) -> bool {
        self.type_key() == Some(key)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub total: usize,
    #[serde(default)]
    pub offset: usize,
    #[serde(default)]
    pub limit: usize,
    #[serde(default)]
    pub has_more: bool,
}

/// One page of search results
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SearchPage {
    pub data: Vec<StoreObject>,
    #[serde(default)]
    pub pagination: Pagination,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Space {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TypeInfo {
    pub id: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PropertyInfo {
    pub id: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub format: String,
}
