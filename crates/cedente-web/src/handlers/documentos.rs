use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use cedente_domain::DocumentChecklist;
use serde_json::{json, Value};

use super::json_body;
use crate::error::ApiResult;
use crate::state::{blocking, AppState};

pub async fn get(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<Json<Value>> {
  let svc = state.service.clone();
  let docs = blocking(move || Ok(svc.documents(id)?)).await?;
  Ok(Json(json!({
    "success": true,
    "documentos": docs,
    "documentos_completos": docs.is_complete(),
    "entregues": docs.completed_count(),
    "total": DocumentChecklist::ITEMS.len(),
    "pendentes": docs.missing(),
  })))
}

pub async fn save(State(state): State<AppState>,
                  Path(id): Path<i32>,
                  body: Result<Json<DocumentChecklist>, JsonRejection>)
                  -> ApiResult<Json<Value>> {
  let docs = json_body(body)?;
  let svc = state.service.clone();
  let saved = blocking(move || Ok(svc.save_documents(id, &docs)?)).await?;
  Ok(Json(json!({
    "success": true,
    "message": "Documentos atualizados com sucesso",
    "documentos": saved,
    "documentos_completos": saved.is_complete(),
  })))
}

pub async fn status(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<Json<Value>> {
  let svc = state.service.clone();
  let docs = blocking(move || Ok(svc.documents(id)?)).await?;
  Ok(Json(json!({ "success": true, "documentos_completos": docs.is_complete() })))
}
