//! Servidor HTTP do cadastro de cedentes: API JSON, painel renderizado e
//! tarefas em segundo plano.

pub mod config;
pub mod error;
pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::{AppConfig, ConfigError};
pub use error::{ApiError, ApiResult};
pub use routes::build_router;
pub use state::AppState;

/// Sobe o servidor em `config.bind_addr()` e atende até o processo ser
/// interrompido (Ctrl+C).
pub async fn serve(state: AppState) -> std::io::Result<()> {
  let addr = state.config.bind_addr();
  let jobs = jobs::spawn_background_jobs(&state);
  let app = build_router(state);

  let listener = tokio::net::TcpListener::bind(&addr).await?;
  log::info!("servidor ouvindo em http://{}", addr);
  axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

  for job in jobs {
    job.abort();
  }
  log::info!("servidor encerrado");
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    log::error!("falha ao aguardar Ctrl+C: {}", e);
  }
}
