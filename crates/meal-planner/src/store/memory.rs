//! In-Memory Store
//!
//! For testing and demo purposes. Holds recipes and plans in process and can
//! be switched offline to exercise failure paths.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{sort_headers, MealStore};
use crate::error::{MealError, Result, StoreError};
use crate::model::{find_recipe, PlanHeader, Recipe, RecipeDraft, StoredPlan};

/// In-memory meal store
#[derive(Default)]
pub struct MemoryStore {
    recipes: RwLock<Vec<Recipe>>,
    plans: RwLock<Vec<StoredPlan>>,
    next_id: AtomicUsize,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with recipes
    pub fn with_recipes(recipes: impl IntoIterator<Item = Recipe>) -> Self {
        let store = Self::new();
        let recipes = recipes
            .into_iter()
            .map(|r| {
                if r.id.is_some() {
                    r
                } else {
                    let id = store.allocate_id();
                    r.with_id(id)
                }
            })
            .collect();
        Self {
            recipes: RwLock::new(recipes),
            ..store
        }
    }

    /// Make every call fail as if the store were unreachable
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Plans currently held, in insertion order
    pub async fn plans(&self) -> Vec<StoredPlan> {
        self.plans.read().await.clone()
    }

    /// Insert a plan as-is, replacing any plan for the same week
    pub async fn insert_plan(&self, mut plan: StoredPlan) -> StoredPlan {
        if plan.id.is_none() {
            plan.id = Some(self.allocate_id());
        }
        let mut plans = self.plans.write().await;
        plans.retain(|p| p.week_of != plan.week_of);
        plans.push(plan.clone());
        plan
    }

    fn allocate_id(&self) -> String {
        format!("mem-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Api {
                status: 503,
                body: "store offline".into(),
            }
            .into());
        }
        Ok(())
    }
}

#[async_trait]
impl MealStore for MemoryStore {
    async fn recipes(&self) -> Result<Vec<Recipe>> {
        self.check_online()?;
        Ok(self.recipes.read().await.clone())
    }

    async fn plan_headers(&self) -> Result<Vec<PlanHeader>> {
        self.check_online()?;
        let plans = self.plans.read().await;
        Ok(sort_headers(
            plans
                .iter()
                .map(|p| PlanHeader {
                    id: p.id.clone().unwrap_or_default(),
                    week_of: p.week_of,
                })
                .collect(),
        ))
    }

    async fn load_plan(&self, header: &PlanHeader) -> Result<StoredPlan> {
        self.check_online()?;
        self.plans
            .read()
            .await
            .iter()
            .find(|p| p.id.as_deref() == Some(header.id.as_str()))
            .cloned()
            .ok_or_else(|| {
                StoreError::Api {
                    status: 404,
                    body: format!("object {} not found", header.id),
                }
                .into()
            })
    }

    async fn create_recipe(&self, draft: &RecipeDraft) -> Result<Recipe> {
        self.check_online()?;
        let mut recipes = self.recipes.write().await;
        if find_recipe(&recipes, &draft.name).is_some() {
            return Err(MealError::RecipeExists(draft.name.trim().to_string()));
        }

        let recipe = Recipe::new(draft.name.trim())
            .with_id(self.allocate_id())
            .with_description(draft.description.clone())
            .with_body(draft.body());
        recipes.push(recipe.clone());
        Ok(recipe)
    }

    async fn save_plan(&self, plan: &StoredPlan) -> Result<StoredPlan> {
        self.check_online()?;
        let mut plans = self.plans.write().await;

        match plan.id.as_deref() {
            Some(id) => {
                let slot = plans
                    .iter_mut()
                    .find(|p| p.id.as_deref() == Some(id))
                    .ok_or_else(|| StoreError::Api {
                        status: 404,
                        body: format!("object {id} not found"),
                    })?;
                *slot = plan.clone();
                Ok(plan.clone())
            }
            None => {
                let saved = StoredPlan {
                    id: Some(self.allocate_id()),
                    ..plan.clone()
                };
                plans.push(saved.clone());
                Ok(saved)
            }
        }
    }

    fn name(&self) -> &str {
        "Memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Day, MealPlan};
    use chrono::NaiveDate;

    fn monday(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, day).unwrap()
    }

    #[tokio::test]
    async fn test_find_recipe_is_case_insensitive() {
        let store = MemoryStore::with_recipes([Recipe::new("Chili"), Recipe::new("Oats")]);

        let recipe = store.find_recipe("  chili ").await.unwrap();
        assert_eq!(recipe.name, "Chili");
        assert!(recipe.id.is_some());

        let missing = store.find_recipe("Pizza").await;
        assert!(matches!(missing, Err(MealError::RecipeNotFound(name)) if name == "Pizza"));
    }

    #[tokio::test]
    async fn test_save_plan_creates_then_updates() {
        let store = MemoryStore::new();
        let plan = StoredPlan {
            id: None,
            week_of: monday(17),
            plan: MealPlan::from_names(["Oats"]),
        };

        let mut saved = store.save_plan(&plan).await.unwrap();
        assert!(saved.id.is_some());

        saved.plan.set(Day::Monday, Some("Chili".into()));
        store.save_plan(&saved).await.unwrap();

        let current = store.plan_for_week(monday(17)).await.unwrap().unwrap();
        assert_eq!(current.plan.get(Day::Monday), Some("Chili"));
        assert_eq!(store.plans().await.len(), 1);
    }

    #[tokio::test]
    async fn test_plans_before_newest_first() {
        let store = MemoryStore::new();
        for day in [3, 10, 17] {
            store
                .insert_plan(StoredPlan {
                    id: None,
                    week_of: monday(day),
                    plan: MealPlan::from_names([format!("R{day}")]),
                })
                .await;
        }

        let history = store.plans_before(monday(17), 2).await.unwrap();
        let weeks: Vec<_> = history.iter().map(|p| p.week_of).collect();
        assert_eq!(weeks, vec![monday(10), monday(3)]);
    }

    #[tokio::test]
    async fn test_offline_store_fails() {
        let store = MemoryStore::with_recipes([Recipe::new("Oats")]);
        store.set_offline(true);

        let err = store.recipes().await.unwrap_err();
        assert!(matches!(err, MealError::Store(StoreError::Api { status: 503, .. })));
    }
}
