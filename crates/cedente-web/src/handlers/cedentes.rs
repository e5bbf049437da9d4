//! CRUD de cedentes.
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use cedente_domain::{Cedente, CedenteInput, ContractStatus, DocumentoKind, ExpiryStatus};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};

use super::{json_body, ListQuery};
use crate::error::ApiResult;
use crate::state::{blocking, AppState};

/// Cedente como exposto pela API, com os campos derivados.
#[derive(Debug, Serialize)]
pub struct CedenteView {
  #[serde(flatten)]
  pub cedente: Cedente,
  pub cpf_cnpj_formatado: String,
  pub tipo_documento: DocumentoKind,
  pub status_label: &'static str,
  pub documentos_completos: bool,
  pub situacao_validade: ExpiryStatus,
  pub situacao_validade_label: &'static str,
  pub dias_para_vencimento: Option<i64>,
}

impl CedenteView {
  pub fn new(cedente: Cedente, today: NaiveDate, window_days: i64) -> Self {
    let situacao = cedente.expiry_status(today, window_days);
    Self { cpf_cnpj_formatado: cedente.cpf_cnpj.formatted(),
           tipo_documento: cedente.cpf_cnpj.kind(),
           status_label: cedente.status.label(),
           documentos_completos: cedente.documentos.is_complete(),
           situacao_validade: situacao,
           situacao_validade_label: situacao.label(),
           dias_para_vencimento: cedente.days_until_expiry(today),
           cedente }
  }
}

fn view(state: &AppState, cedente: Cedente) -> CedenteView {
  CedenteView::new(cedente, state.today(), state.config.expiry_window_days)
}

pub async fn list(State(state): State<AppState>, Query(query): Query<ListQuery>) -> ApiResult<Json<Value>> {
  let filter = query.filter()?;
  let svc = state.service.clone();
  let cedentes = blocking(move || Ok(svc.list(&filter)?)).await?;
  let items: Vec<CedenteView> = cedentes.into_iter().map(|c| view(&state, c)).collect();
  Ok(Json(json!({ "success": true, "total": items.len(), "cedentes": items })))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<Json<Value>> {
  let svc = state.service.clone();
  let cedente = blocking(move || Ok(svc.get(id)?)).await?;
  Ok(Json(json!({ "success": true, "cedente": view(&state, cedente) })))
}

pub async fn create(State(state): State<AppState>,
                    body: Result<Json<CedenteInput>, JsonRejection>)
                    -> ApiResult<(StatusCode, Json<Value>)> {
  let input = json_body(body)?;
  let svc = state.service.clone();
  let cedente = blocking(move || Ok(svc.create(input)?)).await?;
  Ok((StatusCode::CREATED,
      Json(json!({
        "success": true,
        "message": "Cedente cadastrado com sucesso",
        "cedente": view(&state, cedente),
      }))))
}

pub async fn update(State(state): State<AppState>,
                    Path(id): Path<i32>,
                    body: Result<Json<CedenteInput>, JsonRejection>)
                    -> ApiResult<Json<Value>> {
  let input = json_body(body)?;
  let svc = state.service.clone();
  let cedente = blocking(move || Ok(svc.update(id, input)?)).await?;
  Ok(Json(json!({
    "success": true,
    "message": "Cedente atualizado com sucesso",
    "cedente": view(&state, cedente),
  })))
}

pub async fn delete(State(state): State<AppState>, Path(id): Path<i32>) -> ApiResult<Json<Value>> {
  let svc = state.service.clone();
  blocking(move || Ok(svc.delete(id)?)).await?;
  Ok(Json(json!({ "success": true, "message": "Cedente excluído com sucesso" })))
}

pub async fn delete_all(State(state): State<AppState>) -> ApiResult<Json<Value>> {
  let svc = state.service.clone();
  let removed = blocking(move || Ok(svc.delete_all()?)).await?;
  Ok(Json(json!({
    "success": true,
    "message": format!("{} cedente(s) excluído(s)", removed),
    "removidos": removed,
  })))
}

pub async fn status_options() -> Json<Value> {
  let options: Vec<Value> = ContractStatus::ALL.iter()
                                               .map(|s| json!({ "value": s.key(), "label": s.label() }))
                                               .collect();
  Json(json!({ "success": true, "status": options, "default": ContractStatus::default().key() }))
}
