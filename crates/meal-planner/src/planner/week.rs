//! Weekly Plans
//!
//! Random dinner assignment for a week, single-day swaps and the week naming
//! scheme plans are stored under.

use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::PlannerError;
use crate::model::{Day, MealPlan, Recipe, StoredPlan};

const DAYS_PER_WEEK: usize = 7;

fn name_set<'a>(names: impl IntoIterator<Item = &'a str>) -> HashSet<String> {
    names.into_iter().map(|n| n.trim().to_lowercase()).collect()
}

/// Recipes passing the first exclusion set that leaves any candidates
///
/// Falls back to the whole pool when every tier is empty.
fn candidates<'a>(recipes: &'a [Recipe], tiers: &[HashSet<String>]) -> Vec<&'a Recipe> {
    for excluded in tiers {
        let pool: Vec<&Recipe> = recipes
            .iter()
            .filter(|r| !excluded.contains(&r.name.trim().to_lowercase()))
            .collect();
        if !pool.is_empty() {
            return pool;
        }
        tracing::debug!(excluded = excluded.len(), "Exclusions leave no candidates, relaxing");
    }
    recipes.iter().collect()
}

/// Assign one recipe to each day of the week
///
/// Names in `exclude` or `recent` are avoided whenever any other recipe is
/// left. With at least seven candidates every day gets a different recipe;
/// with fewer, each candidate is used once and the rest of the week is filled
/// with random repeats.
pub fn generate_week_plan<R: Rng + ?Sized>(
    rng: &mut R,
    recipes: &[Recipe],
    exclude: &[String],
    recent: &[String],
) -> Result<MealPlan, PlannerError> {
    if recipes.is_empty() {
        return Err(PlannerError::NoRecipes);
    }

    let explicit = name_set(exclude.iter().map(String::as_str));
    let mut with_recent = explicit.clone();
    with_recent.extend(name_set(recent.iter().map(String::as_str)));

    let mut pool = candidates(recipes, &[with_recent, explicit]);

    let picked: Vec<&Recipe> = if pool.len() >= DAYS_PER_WEEK {
        let (chosen, _) = pool.partial_shuffle(rng, DAYS_PER_WEEK);
        chosen.to_vec()
    } else {
        let mut week = pool.clone();
        while week.len() < DAYS_PER_WEEK {
            if let Some(extra) = pool.choose(rng) {
                week.push(*extra);
            }
        }
        week.shuffle(rng);
        week
    };

    Ok(MealPlan::from_names(picked.into_iter().map(|r| r.name.clone())))
}

/// Replace one day with a random recipe
///
/// Candidates exclude `exclude` and everything already in the plan, so the
/// day changes whenever any alternative exists.
pub fn swap_day<R: Rng + ?Sized>(
    rng: &mut R,
    plan: &MealPlan,
    day_label: &str,
    recipes: &[Recipe],
    exclude: &[String],
) -> Result<(Day, MealPlan), PlannerError> {
    let day = Day::parse(day_label)?;
    if recipes.is_empty() {
        return Err(PlannerError::NoRecipes);
    }

    let current = name_set(plan.get(day));
    let explicit = name_set(exclude.iter().map(String::as_str));
    let mut without_plan = explicit.clone();
    without_plan.extend(name_set(plan.recipe_names()));
    let mut without_current = explicit;
    without_current.extend(current.iter().cloned());

    let pool = candidates(recipes, &[without_plan, without_current, current]);
    let choice = pool.choose(rng).ok_or(PlannerError::NoRecipes)?;

    let mut swapped = plan.clone();
    swapped.set(day, Some(choice.name.clone()));
    Ok((day, swapped))
}

/// Put a specific recipe on one day
pub fn assign_day(
    plan: &MealPlan,
    day_label: &str,
    recipe_name: &str,
) -> Result<(Day, MealPlan), PlannerError> {
    let day = Day::parse(day_label)?;
    let mut assigned = plan.clone();
    assigned.set(day, Some(recipe_name.trim().to_string()));
    Ok((day, assigned))
}

/// Recipe names used by the newest `window` plans of `history` (newest first)
pub fn recent_recipe_names(history: &[StoredPlan], window: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    history
        .iter()
        .take(window)
        .flat_map(|p| p.plan.recipe_names())
        .filter(|name| seen.insert(name.to_lowercase()))
        .map(str::to_string)
        .collect()
}

/// Monday of the week containing `date`
pub fn week_monday(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// `Week of YYYY-MM-DD`
pub fn plan_name_for(monday: NaiveDate) -> String {
    format!("Week of {}", monday.format("%Y-%m-%d"))
}

/// Week start encoded in a plan name
pub fn parse_plan_name(name: &str) -> Option<NaiveDate> {
    let date = name.trim().strip_prefix("Week of ")?;
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn recipes(names: &[&str]) -> Vec<Recipe> {
        names.iter().map(|n| Recipe::new(*n)).collect()
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    fn distinct(plan: &MealPlan) -> usize {
        plan.recipe_names().into_iter().collect::<HashSet<_>>().len()
    }

    #[test]
    fn test_large_pool_gives_seven_distinct() {
        let pool = recipes(&["A", "B", "C", "D", "E", "F", "G", "H", "I", "J"]);
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let plan = generate_week_plan(&mut rng, &pool, &[], &[]).unwrap();
            assert_eq!(plan.recipe_names().len(), 7);
            assert_eq!(distinct(&plan), 7, "seed {seed}");
        }
    }

    #[test]
    fn test_exclusions_respected() {
        let pool = recipes(&["A", "B", "C", "D", "E", "F", "G", "H", "I"]);
        let exclude = names(&["a", "B"]);
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let plan = generate_week_plan(&mut rng, &pool, &exclude, &[]).unwrap();
            assert!(!plan.recipe_names().iter().any(|n| *n == "A" || *n == "B"));
            assert_eq!(distinct(&plan), 7);
        }
    }

    #[test]
    fn test_recent_history_avoided_with_forced_repeat() {
        let pool = recipes(&["A", "B", "C", "D", "E", "F", "G", "H"]);
        let recent = names(&["A", "B"]);
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let plan = generate_week_plan(&mut rng, &pool, &[], &recent).unwrap();
            let used = plan.recipe_names();

            assert_eq!(used.len(), 7);
            assert!(!used.iter().any(|n| *n == "A" || *n == "B"));
            assert_eq!(distinct(&plan), 6, "every candidate used once plus one repeat");
        }
    }

    #[test]
    fn test_small_pool_repeats() {
        let pool = recipes(&["A", "B", "C"]);
        let mut rng = StdRng::seed_from_u64(7);
        let plan = generate_week_plan(&mut rng, &pool, &[], &[]).unwrap();

        assert_eq!(plan.recipe_names().len(), 7);
        assert_eq!(distinct(&plan), 3);
    }

    #[test]
    fn test_fallback_tiers() {
        let pool = recipes(&["A", "B"]);
        let mut rng = StdRng::seed_from_u64(1);

        // history would empty the pool: only explicit exclusions apply
        let plan = generate_week_plan(&mut rng, &pool, &names(&["A"]), &names(&["B"])).unwrap();
        assert!(plan.recipe_names().iter().all(|n| *n == "B"));

        // everything excluded: whole pool
        let plan = generate_week_plan(&mut rng, &pool, &names(&["A", "B"]), &[]).unwrap();
        assert_eq!(plan.recipe_names().len(), 7);
    }

    #[test]
    fn test_empty_pool() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(
            generate_week_plan(&mut rng, &[], &[], &[]),
            Err(PlannerError::NoRecipes)
        );
    }

    #[test]
    fn test_seeded_plans_are_reproducible() {
        let pool = recipes(&["A", "B", "C", "D", "E", "F", "G", "H", "I"]);
        let first = generate_week_plan(&mut StdRng::seed_from_u64(42), &pool, &[], &[]).unwrap();
        let second = generate_week_plan(&mut StdRng::seed_from_u64(42), &pool, &[], &[]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_swap_changes_exactly_one_day() {
        let pool = recipes(&["A", "B", "C", "D", "E", "F", "G", "H"]);
        let plan = MealPlan::from_names(["A", "B", "C", "D", "E", "F", "G"]);

        for day in Day::ALL {
            let mut rng = StdRng::seed_from_u64(day.index() as u64);
            let (swapped_day, swapped) = swap_day(&mut rng, &plan, day.name(), &pool, &[]).unwrap();

            assert_eq!(swapped_day, day);
            let changed: Vec<Day> = Day::ALL
                .into_iter()
                .filter(|d| swapped.get(*d) != plan.get(*d))
                .collect();
            assert_eq!(changed, vec![day]);
            assert_eq!(swapped.get(day), Some("H"));
        }
    }

    #[test]
    fn test_swap_without_spare_recipe_still_changes_day() {
        let pool = recipes(&["A", "B"]);
        let plan = MealPlan::from_names(["A", "B", "A", "B", "A", "B", "A"]);
        let mut rng = StdRng::seed_from_u64(3);

        let (_, swapped) = swap_day(&mut rng, &plan, "mon", &pool, &[]).unwrap();
        assert_eq!(swapped.get(Day::Monday), Some("B"));
    }

    #[test]
    fn test_swap_invalid_day() {
        let pool = recipes(&["A"]);
        let mut rng = StdRng::seed_from_u64(0);
        let result = swap_day(&mut rng, &MealPlan::new(), "Someday", &pool, &[]);
        assert_eq!(result, Err(PlannerError::InvalidDay("Someday".into())));
    }

    #[test]
    fn test_assign_day() {
        let plan = MealPlan::from_names(["A", "B"]);
        let (day, assigned) = assign_day(&plan, "TUE", "Chili").unwrap();
        assert_eq!(day, Day::Tuesday);
        assert_eq!(assigned.recipe_names(), vec!["A", "Chili"]);
    }

    #[test]
    fn test_recent_names_respect_window() {
        let week = |d: u32, names: &[&str]| StoredPlan {
            id: None,
            week_of: NaiveDate::from_ymd_opt(2025, 2, d).unwrap(),
            plan: MealPlan::from_names(names.iter().copied()),
        };
        let history = vec![week(10, &["A", "B"]), week(3, &["b", "C"]), week(24, &["D"])];

        assert_eq!(recent_recipe_names(&history, 2), vec!["A", "B", "C"]);
        assert_eq!(recent_recipe_names(&history, 1), vec!["A", "B"]);
        assert!(recent_recipe_names(&history, 0).is_empty());
    }

    #[test]
    fn test_week_naming() {
        let thursday = NaiveDate::from_ymd_opt(2025, 2, 20).unwrap();
        let monday = week_monday(thursday);

        assert_eq!(monday, NaiveDate::from_ymd_opt(2025, 2, 17).unwrap());
        assert_eq!(week_monday(monday), monday);
        assert_eq!(plan_name_for(monday), "Week of 2025-02-17");
        assert_eq!(parse_plan_name("Week of 2025-02-17"), Some(monday));
        assert_eq!(parse_plan_name("Groceries"), None);
    }
}
