//! meal-agent HTTP Server
//!
//! Axum server the chat transport calls with each user message. Wires the
//! Anthropic provider to the meal planning tools over the Anytype store.

mod config;
mod handlers;
mod state;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::LlmProvider;
use agent_runtime::AnthropicProvider;
use meal_planner::model::{MEAL_PLAN_TYPE, RECIPE_TYPE};
use meal_planner::{AnytypeClient, AnytypeStore, MealToolRegistry, RateLimiter, ToolName};

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    // One request budget for every Anytype call in the process
    let limiter = Arc::new(RateLimiter::anytype_default());
    let client = Arc::new(AnytypeClient::new(&config.store, Arc::clone(&limiter))?);
    tracing::info!(url = %config.store.base_url, space = %config.store.space_id, "Using Anytype store");
    check_store(&client, &config.store.space_id).await;
    let store = Arc::new(
        AnytypeStore::new(client, config.store.space_id.clone()).with_page_size(config.store.page_size),
    );

    let tools = Arc::new(MealToolRegistry::new(store, config.planner.clone()));
    let names: Vec<&str> = ToolName::ALL.iter().map(|t| t.as_str()).collect();
    tracing::info!(tools = ?names, "Registered tools");

    let provider = Arc::new(AnthropicProvider::from_config(config.anthropic.clone())?);
    let info = provider.info();
    match provider.health_check().await {
        Ok(true) => tracing::info!(provider = %info.name, model = %config.model, "Connected to reasoning service"),
        Ok(false) | Err(_) => tracing::warn!(provider = %info.name, "Reasoning service not reachable, requests will fail"),
    }

    if config.allowed_users.is_empty() {
        tracing::warn!("ALLOWED_USERS is empty, every caller is admitted");
    } else {
        tracing::info!(count = config.allowed_users.len(), "Caller allow-list loaded");
    }

    let state = AppState {
        provider,
        tools,
        allowed_users: Arc::new(config.allowed_users.clone()),
        model: config.model.clone(),
        max_rounds: config.max_rounds,
    };

    let app = handlers::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, max_rounds = config.max_rounds, "meal-server listening");
    tracing::info!("  GET  /health    - Health check");
    tracing::info!("  POST /api/chat  - Run one interaction");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Warn early when the space or its object types are missing
async fn check_store(client: &AnytypeClient, space_id: &str) {
    match client.list_spaces().await {
        Ok(spaces) if spaces.iter().any(|s| s.id == space_id) => {}
        Ok(_) => tracing::warn!(space = %space_id, "Configured space not found in Anytype"),
        Err(e) => {
            tracing::warn!(error = %e, "Anytype API not reachable, tool calls will fail");
            return;
        }
    }

    match client.list_types(space_id).await {
        Ok(types) => {
            for key in [RECIPE_TYPE, MEAL_PLAN_TYPE] {
                if !types.iter().any(|t| t.key == key) {
                    tracing::warn!(type_key = key, "Object type missing from space");
                }
            }
        }
        Err(e) => tracing::warn!(error = %e, "Could not list object types"),
    }
}
