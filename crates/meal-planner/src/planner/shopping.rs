//! Shopping List Aggregation

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::Recipe;

/// Flatten ingredient lists, merging case-insensitively equal entries
///
/// The first spelling seen wins and first-seen order is kept, so aggregating
/// an already aggregated list returns it unchanged.
pub fn aggregate_ingredients<'a, I>(lists: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a [String]>,
{
    let mut seen = HashSet::new();
    let mut merged = Vec::new();

    for item in lists.into_iter().flatten() {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        if seen.insert(item.to_lowercase()) {
            merged.push(item.to_string());
        }
    }

    merged
}

/// Ingredients needed for a set of recipes
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingList {
    pub ingredients: Vec<String>,
}

impl ShoppingList {
    pub fn from_recipes<'a>(recipes: impl IntoIterator<Item = &'a Recipe>) -> Self {
        Self {
            ingredients: aggregate_ingredients(recipes.into_iter().map(|r| r.ingredients.as_slice())),
        }
    }

    pub fn len(&self) -> usize {
        self.ingredients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty()
    }
}

impl std::fmt::Display for ShoppingList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Shopping list:")?;
        for item in &self.ingredients {
            writeln!(f, "[ ] {item}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_case_insensitive_merge_across_recipes() {
        let first = list(&["Tomato"]);
        let second = list(&["tomato", "Onion"]);

        let merged = aggregate_ingredients([first.as_slice(), second.as_slice()]);
        assert_eq!(merged, vec!["Tomato", "Onion"]);
    }

    #[test]
    fn test_idempotent() {
        let lists = [list(&["Salt", " Pepper ", "salt", ""]), list(&["PEPPER", "Rice"])];
        let once = aggregate_ingredients(lists.iter().map(Vec::as_slice));
        let twice = aggregate_ingredients([once.as_slice()]);

        assert_eq!(once, vec!["Salt", "Pepper", "Rice"]);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_from_recipes() {
        let oats = Recipe::new("Oats").with_body("## Ingredients\n- Oats\n- Milk\n");
        let pudding = Recipe::new("Pudding").with_body("## Ingredients\n- milk\n- Sugar\n");

        let shopping = ShoppingList::from_recipes([&oats, &pudding]);
        assert_eq!(shopping.ingredients, vec!["Oats", "Milk", "Sugar"]);
        assert_eq!(shopping.to_string(), "Shopping list:\n[ ] Oats\n[ ] Milk\n[ ] Sugar\n");
    }
}
