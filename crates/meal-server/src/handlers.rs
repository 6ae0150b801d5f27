//! HTTP Handlers
//!
//! The chat transport posts each incoming message to `/api/chat` and relays
//! the reply. Every interaction runs in a fresh conversation.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use agent_core::AgentError;

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider: String,
    pub provider_connected: bool,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub caller_id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub aborted: bool,
    pub rounds: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            code: code.into(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/chat", post(chat_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider_connected = state.provider.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider: state.provider.info().name,
        provider_connected,
    })
}

/// Run one interaction for an allowed caller
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if !state.allowed_users.allows(&payload.caller_id) {
        tracing::warn!(caller_id = %payload.caller_id, "Rejected caller");
        return Err(error(StatusCode::FORBIDDEN, "UNAUTHORIZED", "Unauthorized."));
    }

    let message = payload.message.trim();
    if message.is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "EMPTY_MESSAGE", "Message is empty."));
    }

    let reply = state.agent().ask(message).await.map_err(|e| {
        tracing::error!(error = %e, "Agent error");
        error(status_for(&e), "AGENT_ERROR", e.user_message())
    })?;

    tracing::info!(
        caller_id = %payload.caller_id,
        rounds = reply.rounds,
        aborted = reply.aborted(),
        "Interaction finished"
    );

    Ok(Json(ChatResponse {
        aborted: reply.aborted(),
        rounds: reply.rounds,
        reply: reply.text,
    }))
}

fn status_for(err: &AgentError) -> StatusCode {
    match err {
        AgentError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        e if e.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::BAD_GATEWAY,
    }
}
