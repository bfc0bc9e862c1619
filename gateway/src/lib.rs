//! HTTP Gateway for the Savor engine
//!
//! Exposes the dialog orchestrator over REST so channel integrations
//! (web chat widgets, messengers, test harnesses) can drive conversations
//! without linking the engine directly.
//!
//! # Endpoints
//!
//! - POST /v1/chat - Run one dialog turn
//! - GET /healthz - Liveness and version probe

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use savor_engine::dialog::DialogOrchestrator;

/// Gateway state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Dialog entry point; one orchestrator serves every session
    pub orchestrator: Arc<DialogOrchestrator>,
}

/// One dialog turn from a channel integration
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Session to continue; a new one is minted when omitted
    #[serde(default)]
    pub session_id: Option<String>,
    /// The user's utterance
    pub text: String,
}

/// The reply for one dialog turn
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    /// Session the turn belongs to, minted or echoed
    pub session_id: String,
    /// Text to show the user
    pub message: String,
    /// Wire name of the intent this turn closed, if any
    pub fulfilled_intent: Option<String>,
}

/// Build the gateway router over the shared state
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/chat", post(chat_handler))
        .route("/healthz", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run one dialog turn
async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, Response> {
    if payload.text.len() > 4096 {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Utterance too long"})),
        )
            .into_response());
    }

    let reply = state
        .orchestrator
        .respond(payload.session_id.as_deref(), &payload.text)
        .await;

    Ok(Json(ChatResponse {
        session_id: reply.session_id,
        message: reply.message,
        fulfilled_intent: reply.fulfilled.map(|intent| intent.wire_name().to_string()),
    }))
}

/// Liveness probe
async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "running",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
