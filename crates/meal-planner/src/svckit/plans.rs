//! Plan Tools
//!
//! `get_current_plan`, `plan_week` and `swap_meal`, plus the context snapshot
//! seeded into the system prompt. The active plan is the one stored for the
//! week containing `today`.

use chrono::{Datelike, NaiveDate};
use rand::Rng;
use serde_json::{json, Value};

use super::{PlanWeekArgs, SwapMealArgs};
use crate::error::{MealError, Result};
use crate::model::{find_recipe, StoredPlan};
use crate::planner::{
    assign_day, generate_week_plan, recent_recipe_names, swap_day, week_monday, PlannerSettings,
};
use crate::store::MealStore;

/// This week's plan, or `NoCurrentPlan`
pub(super) async fn current_plan(store: &dyn MealStore, today: NaiveDate) -> Result<StoredPlan> {
    store
        .plan_for_week(week_monday(today))
        .await?
        .ok_or(MealError::NoCurrentPlan)
}

/// Day-by-day view of a plan
fn plan_days(plan: &StoredPlan) -> Vec<Value> {
    plan.plan
        .days()
        .map(|(day, recipe)| {
            let date = day.date_in_week(plan.week_of);
            json!({
                "day": day.name(),
                "date": date.format("%Y-%m-%d").to_string(),
                "recipe": recipe,
            })
        })
        .collect()
}

fn format_plan(plan: &StoredPlan) -> String {
    let mut text = format!("Meal plan for week of {}:\n", plan.week_of.format("%Y-%m-%d"));
    for (day, recipe) in plan.plan.days() {
        let date = day.date_in_week(plan.week_of);
        text.push_str(&format!(
            "  {} {}/{}: {}\n",
            day,
            date.month(),
            date.day(),
            recipe.unwrap_or("(nothing planned)")
        ));
    }
    text
}

pub(super) async fn get_current_plan(store: &dyn MealStore, today: NaiveDate) -> Result<Value> {
    let plan = current_plan(store, today).await?;
    Ok(json!({
        "name": plan.name(),
        "days": plan_days(&plan),
        "plan": format_plan(&plan),
    }))
}

pub(super) async fn plan_week<R: Rng + Send>(
    store: &dyn MealStore,
    rng: &mut R,
    today: NaiveDate,
    settings: &PlannerSettings,
    args: &PlanWeekArgs,
) -> Result<Value> {
    let monday = week_monday(today);
    let recipes = store.recipes().await?;

    let history = store.plans_before(monday, settings.history_window).await?;
    let recent = recent_recipe_names(&history, settings.history_window);

    let plan = generate_week_plan(rng, &recipes, &args.exclude, &recent)?;
    let existing = store.plan_for_week(monday).await?;

    let saved = store
        .save_plan(&StoredPlan {
            id: existing.and_then(|p| p.id),
            week_of: monday,
            plan,
        })
        .await?;
    tracing::info!(week_of = %monday, avoided = recent.len(), "Planned week");

    Ok(json!({
        "name": saved.name(),
        "days": plan_days(&saved),
        "avoided_recent": recent,
        "plan": format_plan(&saved),
    }))
}

pub(super) async fn swap_meal<R: Rng + Send>(
    store: &dyn MealStore,
    rng: &mut R,
    today: NaiveDate,
    args: &SwapMealArgs,
) -> Result<Value> {
    let current = current_plan(store, today).await?;
    let recipes = store.recipes().await?;

    let (day, plan) = match args.requested() {
        Some(requested) => {
            let recipe = find_recipe(&recipes, requested)
                .ok_or_else(|| MealError::RecipeNotFound(requested.to_string()))?;
            assign_day(&current.plan, &args.day, &recipe.name)?
        }
        None => swap_day(rng, &current.plan, &args.day, &recipes, &args.exclude)?,
    };

    let previous = current.plan.get(day).map(str::to_string);
    let saved = store.save_plan(&StoredPlan { plan, ..current }).await?;
    let new_recipe = saved.plan.get(day);
    tracing::info!(%day, ?previous, ?new_recipe, "Swapped meal");

    Ok(json!({
        "swapped": day.name(),
        "previous": previous,
        "new_recipe": new_recipe,
    }))
}

/// Recipe names and this week's plan, for the system prompt
pub(super) async fn context_snapshot(store: &dyn MealStore, today: NaiveDate) -> Result<String> {
    let recipes = store.recipes().await?;
    let names: Vec<&str> = recipes.iter().map(|r| r.name.as_str()).collect();

    let mut context = if names.is_empty() {
        "No recipes yet.\n".to_string()
    } else {
        format!("Recipes ({}): {}\n", names.len(), names.join(", "))
    };

    match store.plan_for_week(week_monday(today)).await? {
        Some(plan) => context.push_str(&format_plan(&plan)),
        None => context.push_str("No plan for this week yet.\n"),
    }

    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Day, MealPlan};
    use crate::svckit::tests::{insert_current_plan, seeded_store, today};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const WEEK: [&str; 7] = ["Chili", "Tacos", "Oats", "Curry", "Pasta", "Soup", "Salad"];

    #[tokio::test]
    async fn test_no_current_plan() {
        let store = seeded_store();
        let err = get_current_plan(store.as_ref(), today()).await.unwrap_err();
        assert!(matches!(err, MealError::NoCurrentPlan));
        assert_eq!(err.to_string(), "No plan for this week");
    }

    #[tokio::test]
    async fn test_get_current_plan() {
        let store = seeded_store();
        insert_current_plan(&store, &WEEK).await;

        let view = get_current_plan(store.as_ref(), today()).await.unwrap();
        assert_eq!(view["name"], "Week of 2025-02-17");
        assert_eq!(view["days"][0], json!({ "day": "Monday", "date": "2025-02-17", "recipe": "Chili" }));
        assert!(view["plan"].as_str().unwrap().contains("Sunday 2/23: Salad"));
    }

    #[tokio::test]
    async fn test_plan_week_creates_then_replaces() {
        let store = seeded_store();
        let mut rng = StdRng::seed_from_u64(5);
        let settings = PlannerSettings::default();

        plan_week(store.as_ref(), &mut rng, today(), &settings, &PlanWeekArgs::default())
            .await
            .unwrap();
        let args = PlanWeekArgs { exclude: vec!["chili".into()] };
        plan_week(store.as_ref(), &mut rng, today(), &settings, &args)
            .await
            .unwrap();

        let plans = store.plans().await;
        assert_eq!(plans.len(), 1, "one plan per week");
        assert!(!plans[0].plan.recipe_names().contains(&"Chili"));
        assert_eq!(plans[0].plan.recipe_names().len(), 7);
    }

    #[tokio::test]
    async fn test_plan_week_avoids_recent_history() {
        let store = seeded_store();
        let last_week = NaiveDate::from_ymd_opt(2025, 2, 10).unwrap();
        store
            .insert_plan(StoredPlan {
                id: None,
                week_of: last_week,
                plan: MealPlan::from_names(["Chili", "Tacos"]),
            })
            .await;

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let view = plan_week(
                store.as_ref(),
                &mut rng,
                today(),
                &PlannerSettings::default(),
                &PlanWeekArgs::default(),
            )
            .await
            .unwrap();

            assert_eq!(view["avoided_recent"], json!(["Chili", "Tacos"]));
            let plan = current_plan(store.as_ref(), today()).await.unwrap();
            let used = plan.plan.recipe_names();
            assert!(!used.contains(&"Chili") && !used.contains(&"Tacos"), "seed {seed}: {used:?}");
        }
    }

    #[tokio::test]
    async fn test_history_window_zero_ignores_history() {
        let store = seeded_store();
        store
            .insert_plan(StoredPlan {
                id: None,
                week_of: NaiveDate::from_ymd_opt(2025, 2, 10).unwrap(),
                plan: MealPlan::from_names(["Chili"]),
            })
            .await;

        let mut rng = StdRng::seed_from_u64(0);
        let settings = PlannerSettings::default().with_history_window(0);
        let view = plan_week(store.as_ref(), &mut rng, today(), &settings, &PlanWeekArgs::default())
            .await
            .unwrap();
        assert_eq!(view["avoided_recent"], json!([]));
    }

    #[tokio::test]
    async fn test_swap_specific_recipe() {
        let store = seeded_store();
        insert_current_plan(&store, &WEEK).await;
        let mut rng = StdRng::seed_from_u64(0);
        let args = SwapMealArgs {
            day: "fri".into(),
            recipe_name: Some("pizza".into()),
            exclude: vec![],
        };

        let result = swap_meal(store.as_ref(), &mut rng, today(), &args).await.unwrap();
        assert_eq!(result, json!({ "swapped": "Friday", "previous": "Pasta", "new_recipe": "Pizza" }));

        let plan = current_plan(store.as_ref(), today()).await.unwrap();
        assert_eq!(plan.plan.get(Day::Friday), Some("Pizza"));
        assert_eq!(plan.plan.get(Day::Thursday), Some("Curry"));
    }

    #[tokio::test]
    async fn test_swap_errors() {
        let store = seeded_store();
        let mut rng = StdRng::seed_from_u64(0);
        let args = SwapMealArgs { day: "Monday".into(), recipe_name: None, exclude: vec![] };
        let err = swap_meal(store.as_ref(), &mut rng, today(), &args).await.unwrap_err();
        assert!(matches!(err, MealError::NoCurrentPlan));

        insert_current_plan(&store, &WEEK).await;
        let args = SwapMealArgs { day: "Caturday".into(), recipe_name: None, exclude: vec![] };
        let err = swap_meal(store.as_ref(), &mut rng, today(), &args).await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown day: Caturday");

        let args = SwapMealArgs { day: "Mon".into(), recipe_name: Some("Lasagna".into()), exclude: vec![] };
        let err = swap_meal(store.as_ref(), &mut rng, today(), &args).await.unwrap_err();
        assert!(matches!(err, MealError::RecipeNotFound(_)));
    }
}
