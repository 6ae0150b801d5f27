//! Markdown Bodies
//!
//! Recipes keep their ingredients under a `## Ingredients` heading; plans keep
//! one `Day M/D: Recipe` line per day.

use chrono::{Datelike, NaiveDate};

use crate::model::{Day, MealPlan};

/// Bullet items under `## Ingredients`, up to the next `## ` heading
pub fn parse_ingredients(body: &str) -> Vec<String> {
    let mut in_section = false;
    let mut ingredients = Vec::new();

    for line in body.lines().map(str::trim) {
        if let Some(heading) = line.strip_prefix("## ") {
            if in_section {
                break;
            }
            in_section = heading.trim().to_lowercase().starts_with("ingredients");
            continue;
        }
        if in_section {
            if let Some(item) = line.strip_prefix("- ") {
                let item = item.trim();
                if !item.is_empty() {
                    ingredients.push(item.to_string());
                }
            }
        }
    }

    ingredients
}

pub fn build_recipe_body(ingredients: &[String], instructions: &[String]) -> String {
    let mut body = String::from("## Ingredients\n");
    for item in ingredients {
        body.push_str(&format!("- {}\n", item.trim()));
    }
    body.push_str("\n## Instructions\n");
    for (i, step) in instructions.iter().enumerate() {
        body.push_str(&format!("{}. {}\n", i + 1, step.trim()));
    }
    body
}

/// Read `Monday 2/17: Name` or `Monday: Name` lines; other lines are ignored
pub fn parse_plan_body(body: &str) -> MealPlan {
    let mut plan = MealPlan::new();

    for line in body.lines() {
        let line = line.trim().trim_start_matches(['-', '*']).trim();
        let Some((label, name)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let Some(day_word) = label.split_whitespace().next() else {
            continue;
        };
        if let Ok(day) = Day::parse(day_word) {
            plan.set(day, Some(name.to_string()));
        }
    }

    plan
}

/// One line per assigned day, dated from the week's Monday
pub fn build_plan_body(plan: &MealPlan, monday: NaiveDate) -> String {
    let mut body = String::new();
    for (day, recipe) in plan.days() {
        if let Some(name) = recipe {
            let date = day.date_in_week(monday);
            body.push_str(&format!("{} {}/{}: {}\n", day, date.month(), date.day(), name));
        }
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHILI: &str = "\
Hearty and quick.

## Ingredients
- Beans
- Tomato
-   Onion

## Instructions
1. Chop
2. Simmer

## Notes
- Freezes well
";

    #[test]
    fn test_parse_ingredients_stops_at_next_heading() {
        assert_eq!(parse_ingredients(CHILI), vec!["Beans", "Tomato", "Onion"]);
        assert!(parse_ingredients("no headings here").is_empty());
        assert_eq!(parse_ingredients("## INGREDIENTS\n- Salt"), vec!["Salt"]);
    }

    #[test]
    fn test_recipe_body_layout() {
        let body = build_recipe_body(
            &["Oats".into(), "Milk".into()],
            &["Boil milk".into(), "Stir in oats".into()],
        );
        assert_eq!(
            body,
            "## Ingredients\n- Oats\n- Milk\n\n## Instructions\n1. Boil milk\n2. Stir in oats\n"
        );
        assert_eq!(parse_ingredients(&body), vec!["Oats", "Milk"]);
    }

    #[test]
    fn test_plan_body_lines() {
        let monday = NaiveDate::from_ymd_opt(2025, 2, 17).unwrap();
        let plan = MealPlan::from_names(["Oats", "Chili"]);

        let body = build_plan_body(&plan, monday);
        assert_eq!(body, "Monday 2/17: Oats\nTuesday 2/18: Chili\n");
        assert_eq!(parse_plan_body(&body), plan);
    }

    #[test]
    fn test_parse_plan_body_by_label() {
        let plan = parse_plan_body("Wednesday: Soup: Deluxe\n\nnot a plan line\n- fri 2/21: Tacos\nMonday:\n");
        assert_eq!(plan.get(Day::Wednesday), Some("Soup: Deluxe"));
        assert_eq!(plan.get(Day::Friday), Some("Tacos"));
        assert_eq!(plan.get(Day::Monday), None);
    }
}
