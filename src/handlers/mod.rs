// src/handlers/mod.rs

use crate::{error::Result, state::AppState};
use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// `GET /api/ping`: forwards to the upstream and returns its body as plain text.
pub async fn ping_handler(State(state): State<Arc<AppState>>) -> Result<String> {
    debug!("Handling ping request");
    state.ping_client.ping().await
}

/// `GET /health`: liveness of this process, independent of the upstream.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let client = &state.ping_client;
    Json(json!({
        "status": "ok",
        "trust_mode": client.trust_mode().as_str(),
        "upstream": client.ping_url().as_str(),
        "uptime_secs": state.uptime_secs(),
    }))
}
