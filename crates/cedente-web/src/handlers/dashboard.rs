//! Painel: estatísticas em JSON e a página renderizada.
use axum::extract::State;
use axum::response::Html;
use axum::Json;
use cedente_domain::CedenteFilter;
use serde_json::{json, Value};

use super::cedentes::CedenteView;
use crate::error::{ApiError, ApiResult};
use crate::state::{blocking, AppState, DASHBOARD_TEMPLATE};

/// Cedentes vencidos ou próximos exibidos na página inicial.
const ALERTAS_MAX: usize = 10;

pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<Value>> {
  let svc = state.service.clone();
  let today = state.today();
  let window = state.config.expiry_window_days;
  let stats = blocking(move || Ok(svc.dashboard(today, window)?)).await?;
  Ok(Json(json!({ "success": true, "estatisticas": stats })))
}

pub async fn page(State(state): State<AppState>) -> ApiResult<Html<String>> {
  let svc = state.service.clone();
  let today = state.today();
  let window = state.config.expiry_window_days;
  let (stats, cedentes, notificacoes) = blocking(move || {
                                          Ok((svc.dashboard(today, window)?,
                                              svc.list(&CedenteFilter::default())?,
                                              svc.unread_notifications()?))
                                        }).await?;
  let mut alertas: Vec<CedenteView> = cedentes.into_iter()
                                              .map(|c| CedenteView::new(c, today, window))
                                              .filter(|v| v.dias_para_vencimento.is_some_and(|d| d <= window))
                                              .collect();
  alertas.sort_by_key(|v| v.dias_para_vencimento);
  alertas.truncate(ALERTAS_MAX);

  let ctx = json!({
    "hoje": cedente_domain::dates::format_br(today),
    "janela_dias": window,
    "stats": stats,
    "alertas": alertas,
    "notificacoes": notificacoes,
  });
  let html = state.templates
                  .render(DASHBOARD_TEMPLATE, &ctx)
                  .map_err(|e| ApiError::Internal(e.to_string()))?;
  Ok(Html(html))
}
