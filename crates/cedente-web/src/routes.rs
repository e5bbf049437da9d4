use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::handlers::{backup, cedentes, dashboard, documentos, health, notificacoes, planilhas};
use crate::middleware::log_requests;
use crate::state::AppState;

/// Folga para os cabeçalhos do multipart além do próprio arquivo.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
  let upload_limit = state.config.max_upload_bytes().saturating_add(MULTIPART_OVERHEAD);

  Router::new().route("/", get(dashboard::page))
               .route("/health", get(health::health))
               .route("/api/cedentes", get(cedentes::list).post(cedentes::create).delete(cedentes::delete_all))
               .route("/api/cedentes/{id}", get(cedentes::get).put(cedentes::update).delete(cedentes::delete))
               .route("/api/cedentes/{id}/documentos", get(documentos::get).post(documentos::save))
               .route("/api/cedentes/{id}/status-documentos", get(documentos::status))
               .route("/api/importar-excel",
                      post(planilhas::import).layer(DefaultBodyLimit::max(upload_limit)))
               .route("/api/exportar/excel", get(planilhas::export_all))
               .route("/api/exportar/excel-filtrado", get(planilhas::export_filtered))
               .route("/api/dashboard/estatisticas", get(dashboard::stats))
               .route("/api/status-contrato", get(cedentes::status_options))
               .route("/api/notificacoes", get(notificacoes::list))
               .route("/api/notificacoes/{id}/marcar-lida", post(notificacoes::mark_read))
               .route("/api/notificacoes/marcar-todas-lidas", post(notificacoes::mark_all_read))
               .route("/api/notificacoes/executar-verificacao-manual", post(notificacoes::run_checks))
               .route("/api/backup/criar", post(backup::create))
               .route("/api/backup/listar", get(backup::list))
               .route("/api/backup/estatisticas", get(backup::stats))
               .layer(middleware::from_fn(log_requests))
               .layer(CorsLayer::permissive())
               .with_state(state)
}
