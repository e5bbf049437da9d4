//! Importação e exportação de planilhas.
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use cedente_domain::CedenteFilter;
use cedente_sheets::{export_csv, export_filename, parse_columns, parse_upload, ExportColumn};
use serde_json::{json, Value};

use super::ListQuery;
use crate::error::{ApiError, ApiResult};
use crate::state::{blocking, AppState};

const UPLOAD_FIELDS: [&str; 2] = ["file", "planilha"];

fn multipart_error(state: &AppState, e: MultipartError) -> ApiError {
  if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
    ApiError::PayloadTooLarge(state.config.max_upload_mb)
  } else {
    ApiError::BadRequest(e.body_text())
  }
}

pub async fn import(State(state): State<AppState>, mut multipart: Multipart) -> ApiResult<Json<Value>> {
  let mut upload = None;
  while let Some(field) = multipart.next_field().await.map_err(|e| multipart_error(&state, e))? {
    if !field.name().is_some_and(|n| UPLOAD_FIELDS.contains(&n)) {
      continue;
    }
    let filename = field.file_name().unwrap_or_default().to_string();
    let bytes = field.bytes().await.map_err(|e| multipart_error(&state, e))?;
    upload = Some((filename, bytes));
    break;
  }
  let (filename, bytes) = upload.ok_or_else(|| ApiError::BadRequest("Nenhum arquivo enviado".to_string()))?;
  if filename.trim().is_empty() {
    return Err(ApiError::BadRequest("Nenhum arquivo selecionado".to_string()));
  }
  if bytes.len() > state.config.max_upload_bytes() {
    return Err(ApiError::PayloadTooLarge(state.config.max_upload_mb));
  }

  let svc = state.service.clone();
  let name = filename.clone();
  let report = blocking(move || {
                 let rows = parse_upload(&name, &bytes)?;
                 Ok(svc.import(rows))
               }).await?;
  log::info!("importação de {}: {} criados, {} atualizados, {} ignorados, {} erros",
             filename,
             report.created,
             report.updated,
             report.skipped.len(),
             report.errors.len());
  Ok(Json(json!({
    "success": true,
    "message": report.message(),
    "processed": report.processed(),
    "relatorio": report,
  })))
}

pub async fn export_all(State(state): State<AppState>) -> ApiResult<Response> {
  export(state, CedenteFilter::default(), ExportColumn::DEFAULT.to_vec(), "cedentes_completo").await
}

pub async fn export_filtered(State(state): State<AppState>, Query(query): Query<ListQuery>) -> ApiResult<Response> {
  let filter = query.filter()?;
  let columns = parse_columns(query.colunas.as_deref())?;
  export(state, filter, columns, "cedentes_filtrado").await
}

async fn export(state: AppState, filter: CedenteFilter, columns: Vec<ExportColumn>, prefix: &str) -> ApiResult<Response> {
  let svc = state.service.clone();
  let today = state.today();
  let window = state.config.expiry_window_days;
  let bytes = blocking(move || {
                let cedentes = svc.list(&filter)?;
                Ok(export_csv(&cedentes, &columns, today, window)?)
              }).await?;
  let filename = export_filename(prefix, state.now());
  let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename))
    .map_err(|e| ApiError::Internal(e.to_string()))?;
  Ok(([(header::CONTENT_TYPE, HeaderValue::from_static("text/csv; charset=utf-8")),
       (header::CONTENT_DISPOSITION, disposition)],
      bytes).into_response())
}
