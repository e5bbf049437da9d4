use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::state::{blocking, AppState};

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Value>> {
  let svc = state.service.clone();
  let items = blocking(move || Ok(svc.unread_notifications()?)).await?;
  Ok(Json(json!({ "success": true, "total": items.len(), "notificacoes": items })))
}

pub async fn mark_read(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<Json<Value>> {
  let svc = state.service.clone();
  blocking(move || Ok(svc.mark_notification_read(id)?)).await?;
  Ok(Json(json!({ "success": true, "message": "Notificação marcada como lida" })))
}

pub async fn mark_all_read(State(state): State<AppState>) -> ApiResult<Json<Value>> {
  let svc = state.service.clone();
  let n = blocking(move || Ok(svc.mark_all_notifications_read()?)).await?;
  Ok(Json(json!({
    "success": true,
    "message": format!("{} notificação(ões) marcada(s) como lida(s)", n),
    "marcadas": n,
  })))
}

pub async fn run_checks(State(state): State<AppState>) -> ApiResult<Json<Value>> {
  let svc = state.service.clone();
  let now = state.now();
  let report = blocking(move || Ok(svc.run_notification_checks(now)?)).await?;
  log::info!("verificação manual: {} notificação(ões) criada(s)", report.total_created());
  Ok(Json(json!({
    "success": true,
    "message": format!("Verificação concluída: {} notificação(ões) criada(s)", report.total_created()),
    "resultado": report,
  })))
}
