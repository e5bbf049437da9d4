use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
  Json(json!({
    "status": "ok",
    "backend": state.backend,
    "timestamp": chrono::Utc::now().to_rfc3339(),
    "uptime_seconds": state.uptime_seconds(),
  }))
}
