//! Backups do SQLite. A restauração só existe na linha de comando.
use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::state::{blocking, AppState};

#[derive(Debug, Default, Deserialize)]
struct CreateBody {
  motivo: Option<String>,
}

/// Aceita corpo vazio ou `{"motivo": "..."}`.
pub async fn create(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
  let parsed: CreateBody = if body.iter().all(u8::is_ascii_whitespace) {
    CreateBody::default()
  } else {
    serde_json::from_slice(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?
  };
  let motivo = parsed.motivo.filter(|m| !m.trim().is_empty()).unwrap_or_else(|| "manual".to_string());
  let manager = state.backup_manager()?;
  let info = blocking(move || Ok(manager.create(&motivo)?)).await?;
  Ok(Json(json!({
    "success": true,
    "message": format!("Backup criado: {}", info.filename),
    "backup": info,
  })))
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Value>> {
  let manager = state.backup_manager()?;
  let backups = blocking(move || Ok(manager.list()?)).await?;
  Ok(Json(json!({ "success": true, "backups": backups })))
}

pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<Value>> {
  let manager = state.backup_manager()?;
  let stats = blocking(move || Ok(manager.stats()?)).await?;
  Ok(Json(json!({ "success": true, "estatisticas": stats })))
}
