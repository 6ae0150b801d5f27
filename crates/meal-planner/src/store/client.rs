//! Anytype HTTP Client
//!
//! Thin client over the Anytype local API. Every request takes a token from the
//! shared [`RateLimiter`] first. Nothing is retried and search results are
//! never paginated here; the repository layer drives pages.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::limiter::RateLimiter;
use crate::error::{MealError, StoreError};
use crate::model::{PropertyInfo, SearchPage, Space, StoreObject, TypeInfo};

/// Value of the `Anytype-Version` header
pub const API_VERSION: &str = "2025-05-21";

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:31012";

type StoreResult<T> = std::result::Result<T, StoreError>;

/// Connection settings for the Anytype API
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Base URL, without the `/v1` suffix
    pub base_url: String,

    /// Bearer token
    pub api_key: String,

    /// Space holding recipes and plans
    pub space_id: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Search page size
    pub page_size: usize,
}

impl StoreConfig {
    pub fn new(api_key: impl Into<String>, space_id: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_API_URL.into(),
            api_key: api_key.into(),
            space_id: space_id.into(),
            timeout_secs: 30,
            page_size: 100,
        }
    }

    /// Read `ANYTYPE_API_KEY`, `ANYTYPE_SPACE_ID` and optional `ANYTYPE_API_URL`
    pub fn from_env() -> crate::Result<Self> {
        let api_key = required_env("ANYTYPE_API_KEY")?;
        let space_id = required_env("ANYTYPE_SPACE_ID")?;
        let mut config = Self::new(api_key, space_id);
        if let Ok(url) = std::env::var("ANYTYPE_API_URL") {
            config = config.with_base_url(url);
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

fn required_env(name: &str) -> crate::Result<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| MealError::Config(format!("{name} is not set")))
}

/// Icon attached to created objects
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Icon {
    pub format: String,
    pub emoji: String,
}

impl Icon {
    pub fn emoji(emoji: impl Into<String>) -> Self {
        Self {
            format: "emoji".into(),
            emoji: emoji.into(),
        }
    }
}

/// Body of an object creation request
#[derive(Clone, Debug, Serialize)]
pub struct NewObject {
    pub type_key: String,
    pub name: String,
    pub body: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: Vec<T>,
}

#[derive(Deserialize)]
struct ObjectEnvelope {
    object: StoreObject,
}

/// Anytype API client
pub struct AnytypeClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    limiter: Arc<RateLimiter>,
}

impl AnytypeClient {
    pub fn new(config: &StoreConfig, limiter: Arc<RateLimiter>) -> StoreResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            limiter,
        })
    }

    pub async fn get(&self, path: &str) -> StoreResult<Value> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> StoreResult<Value> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> StoreResult<Value> {
        self.send(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> StoreResult<Value> {
        self.send(Method::DELETE, path, None).await
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> StoreResult<Value> {
        self.limiter.acquire().await;

        let url = format!("{}/v1{}", self.base_url, path);
        tracing::debug!(%method, %url, "Anytype request");

        let mut request = self
            .http
            .request(method, &url)
            .bearer_auth(&self.api_key)
            .header("Anytype-Version", API_VERSION);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(StoreError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| StoreError::Decode(format!("{url}: {e}")))
    }

    fn decode<T: DeserializeOwned>(value: Value) -> StoreResult<T> {
        serde_json::from_value(value).map_err(|e| StoreError::Decode(e.to_string()))
    }

    pub async fn list_spaces(&self) -> StoreResult<Vec<Space>> {
        let value = self.get("/spaces").await?;
        Ok(Self::decode::<DataEnvelope<Space>>(value)?.data)
    }

    /// One page of objects; an empty query matches everything
    pub async fn search(
        &self,
        space_id: &str,
        query: &str,
        limit: usize,
        offset: usize,
    ) -> StoreResult<SearchPage> {
        let body = serde_json::json!({
            "query": query,
            "limit": limit,
            "offset": offset,
        });
        let value = self.post(&format!("/spaces/{space_id}/search"), &body).await?;
        Self::decode(value)
    }

    pub async fn get_object(&self, space_id: &str, object_id: &str) -> StoreResult<StoreObject> {
        let value = self.get(&format!("/spaces/{space_id}/objects/{object_id}")).await?;
        Ok(Self::decode::<ObjectEnvelope>(value)?.object)
    }

    pub async fn create_object(&self, space_id: &str, object: &NewObject) -> StoreResult<StoreObject> {
        let body = serde_json::to_value(object).map_err(|e| StoreError::Decode(e.to_string()))?;
        let value = self.post(&format!("/spaces/{space_id}/objects"), &body).await?;
        Ok(Self::decode::<ObjectEnvelope>(value)?.object)
    }

    /// Replace an object's markdown body
    pub async fn update_object_body(
        &self,
        space_id: &str,
        object_id: &str,
        markdown: &str,
    ) -> StoreResult<StoreObject> {
        let body = serde_json::json!({ "markdown": markdown });
        let value = self
            .patch(&format!("/spaces/{space_id}/objects/{object_id}"), &body)
            .await?;
        Ok(Self::decode::<ObjectEnvelope>(value)?.object)
    }

    /// Archive an object
    pub async fn delete_object(&self, space_id: &str, object_id: &str) -> StoreResult<()> {
        self.delete(&format!("/spaces/{space_id}/objects/{object_id}")).await?;
        Ok(())
    }

    pub async fn list_types(&self, space_id: &str) -> StoreResult<Vec<TypeInfo>> {
        let value = self.get(&format!("/spaces/{space_id}/types")).await?;
        Ok(Self::decode::<DataEnvelope<TypeInfo>>(value)?.data)
    }

    pub async fn list_properties(&self, space_id: &str) -> StoreResult<Vec<PropertyInfo>> {
        let value = self.get(&format!("/spaces/{space_id}/properties")).await?;
        Ok(Self::decode::<DataEnvelope<PropertyInfo>>(value)?.data)
    }
}
