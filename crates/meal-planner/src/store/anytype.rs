//! Anytype-backed Store

use std::sync::Arc;

use async_trait::async_trait;

use super::client::{AnytypeClient, Icon, NewObject};
use super::{sort_headers, MealStore};
use crate::error::Result;
use crate::model::{
    PlanHeader, Recipe, RecipeDraft, StoreObject, StoredPlan, MEAL_PLAN_TYPE, RECIPE_TYPE,
};
use crate::planner::markdown;

const RECIPE_ICON: &str = "\u{1F373}";

/// Recipes and plans as typed objects in one Anytype space
pub struct AnytypeStore {
    client: Arc<AnytypeClient>,
    space_id: String,
    page_size: usize,
}

impl AnytypeStore {
    pub fn new(client: Arc<AnytypeClient>, space_id: impl Into<String>) -> Self {
        Self {
            client,
            space_id: space_id.into(),
            page_size: 100,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Every object in the space, following pagination until `has_more` is false
    async fn all_objects(&self) -> Result<Vec<StoreObject>> {
        let mut objects = Vec::new();
        let mut offset = 0;

        loop {
            let page = self
                .client
                .search(&self.space_id, "", self.page_size, offset)
                .await?;
            let fetched = page.data.len();
            objects.extend(page.data);

            if !page.pagination.has_more || fetched == 0 {
                break;
            }
            offset += self.page_size;
        }

        tracing::debug!(count = objects.len(), "Fetched space objects");
        Ok(objects)
    }

    async fn objects_of_type(&self, type_key: &str) -> Result<Vec<StoreObject>> {
        Ok(self
            .all_objects()
            .await?
            .into_iter()
            .filter(|o| o.is_type(type_key))
            .collect())
    }
}

#[async_trait]
impl MealStore for AnytypeStore {
    async fn recipes(&self) -> Result<Vec<Recipe>> {
        let objects = self.objects_of_type(RECIPE_TYPE).await?;
        Ok(objects.iter().map(Recipe::from_object).collect())
    }

    async fn load_recipe(&self, recipe: &Recipe) -> Result<Recipe> {
        match &recipe.id {
            Some(id) if !recipe.has_body() => {
                let object = self.client.get_object(&self.space_id, id).await?;
                let mut loaded = Recipe::from_object(&object);
                if loaded.description.is_empty() {
                    loaded.description.clone_from(&recipe.description);
                }
                Ok(loaded)
            }
            _ => Ok(recipe.clone()),
        }
    }

    async fn plan_headers(&self) -> Result<Vec<PlanHeader>> {
        let objects = self.objects_of_type(MEAL_PLAN_TYPE).await?;
        Ok(sort_headers(
            objects.iter().filter_map(PlanHeader::from_object).collect(),
        ))
    }

    async fn load_plan(&self, header: &PlanHeader) -> Result<StoredPlan> {
        let object = self.client.get_object(&self.space_id, &header.id).await?;
        let body = object.markdown.unwrap_or_default();

        Ok(StoredPlan {
            id: Some(header.id.clone()),
            week_of: header.week_of,
            plan: markdown::parse_plan_body(&body),
        })
    }

    async fn create_recipe(&self, draft: &RecipeDraft) -> Result<Recipe> {
        let body = draft.body();
        let request = NewObject {
            type_key: RECIPE_TYPE.into(),
            name: draft.name.trim().to_string(),
            body: body.clone(),
            description: draft.description.clone(),
            icon: Some(Icon::emoji(RECIPE_ICON)),
        };
        let object = self.client.create_object(&self.space_id, &request).await?;
        tracing::info!(id = %object.id, name = %request.name, "Created recipe");

        let name = if object.name.is_empty() { request.name } else { object.name };
        Ok(Recipe::new(name)
            .with_id(object.id)
            .with_description(draft.description.clone())
            .with_body(body))
    }

    async fn save_plan(&self, plan: &StoredPlan) -> Result<StoredPlan> {
        let body = plan.body();

        let id = match &plan.id {
            Some(id) => {
                self.client
                    .update_object_body(&self.space_id, id, &body)
                    .await?;
                tracing::info!(%id, week_of = %plan.week_of, "Updated meal plan");
                id.clone()
            }
            None => {
                let request = NewObject {
                    type_key: MEAL_PLAN_TYPE.into(),
                    name: plan.name(),
                    body,
                    description: String::new(),
                    icon: None,
                };
                let object = self.client.create_object(&self.space_id, &request).await?;
                tracing::info!(id = %object.id, week_of = %plan.week_of, "Created meal plan");
                object.id
            }
        };

        Ok(StoredPlan {
            id: Some(id),
            ..plan.clone()
        })
    }

    fn name(&self) -> &str {
        "Anytype"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Day, MealPlan};
    use crate::store::{RateLimiter, StoreConfig};
    use chrono::NaiveDate;
    use serde_json::json;
    use wiremock::matchers::{body_json, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store(server: &MockServer, page_size: usize) -> AnytypeStore {
        let config = StoreConfig::new("secret", "space-1").with_base_url(server.uri());
        let client = AnytypeClient::new(&config, Arc::new(RateLimiter::anytype_default())).unwrap();
        AnytypeStore::new(Arc::new(client), "space-1").with_page_size(page_size)
    }

    fn object(id: &str, name: &str, type_key: &str) -> serde_json::Value {
        json!({ "id": id, "name": name, "type": { "key": type_key } })
    }

    #[tokio::test]
    async fn test_recipes_follow_pagination() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/spaces/space-1/search"))
            .and(body_json(json!({ "query": "", "limit": 2, "offset": 0 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [object("r1", "Oats", "recipe"), object("p1", "Week of 2025-02-17", "meal_plan")],
                "pagination": { "total": 3, "offset": 0, "limit": 2, "has_more": true }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/spaces/space-1/search"))
            .and(body_json(json!({ "query": "", "limit": 2, "offset": 2 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [object("r2", "Chili", "recipe")],
                "pagination": { "total": 3, "offset": 2, "limit": 2, "has_more": false }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let recipes = store(&server, 2).recipes().await.unwrap();
        let names: Vec<_> = recipes.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Oats", "Chili"]);
    }

    #[tokio::test]
    async fn test_load_plan_parses_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/spaces/space-1/objects/p1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": {
                    "id": "p1",
                    "name": "Week of 2025-02-17",
                    "markdown": "Monday 2/17: Oats\nTuesday 2/18: Chili\n"
                }
            })))
            .mount(&server)
            .await;

        let header = PlanHeader {
            id: "p1".into(),
            week_of: NaiveDate::from_ymd_opt(2025, 2, 17).unwrap(),
        };
        let plan = store(&server, 100).load_plan(&header).await.unwrap();
        assert_eq!(plan.plan.get(Day::Monday), Some("Oats"));
        assert_eq!(plan.plan.get(Day::Tuesday), Some("Chili"));
        assert_eq!(plan.plan.get(Day::Sunday), None);
    }

    #[tokio::test]
    async fn test_save_new_plan_creates_object() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/spaces/space-1/objects"))
            .and(body_partial_json(json!({
                "type_key": "meal_plan",
                "name": "Week of 2025-02-17",
                "body": "Monday 2/17: Oats\n"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": { "id": "new-plan", "name": "Week of 2025-02-17" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let plan = StoredPlan {
            id: None,
            week_of: NaiveDate::from_ymd_opt(2025, 2, 17).unwrap(),
            plan: MealPlan::from_names(["Oats"]),
        };
        let saved = store(&server, 100).save_plan(&plan).await.unwrap();
        assert_eq!(saved.id.as_deref(), Some("new-plan"));
    }

    #[tokio::test]
    async fn test_recipe_body_is_hydrated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/spaces/space-1/objects/r1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": {
                    "id": "r1",
                    "name": "Oats",
                    "markdown": "## Ingredients\n- Oats\n- Milk\n\n## Instructions\n1. Cook\n"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let summary = Recipe::new("Oats").with_id("r1").with_description("Breakfast");
        let recipe = store(&server, 100).load_recipe(&summary).await.unwrap();
        assert_eq!(recipe.ingredients, vec!["Oats", "Milk"]);
        assert_eq!(recipe.description, "Breakfast");
    }
}
