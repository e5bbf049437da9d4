//! Estado compartilhado entre os handlers.
use crate::config::{AppConfig, ConfigError};
use crate::error::{ApiError, ApiResult};
use cedente_domain::{CedenteRepository, CedenteService};
use cedente_persistence::BackupManager;
use chrono::{Local, NaiveDate, NaiveDateTime};
use handlebars::Handlebars;
use std::sync::Arc;
use std::time::Instant;

pub const DASHBOARD_TEMPLATE: &str = "dashboard";

#[derive(Clone)]
pub struct AppState {
  pub service: CedenteService,
  /// Ausente quando o banco não é um arquivo SQLite.
  pub backups: Option<Arc<BackupManager>>,
  pub config: Arc<AppConfig>,
  pub templates: Arc<Handlebars<'static>>,
  /// `sqlite` ou `postgresql`.
  pub backend: &'static str,
  pub start_time: Instant,
}

impl AppState {
  pub fn new(repo: Arc<dyn CedenteRepository>, config: AppConfig, backend: &'static str) -> Result<Self, ConfigError> {
    let mut templates = Handlebars::new();
    templates.register_template_string(DASHBOARD_TEMPLATE, include_str!("../templates/dashboard.hbs"))
             .map_err(|e| ConfigError::Template(e.to_string()))?;
    Ok(Self { service: CedenteService::new(repo),
              backups: None,
              config: Arc::new(config),
              templates: Arc::new(templates),
              backend,
              start_time: Instant::now() })
  }

  pub fn with_backups(mut self, manager: BackupManager) -> Self {
    self.backups = Some(Arc::new(manager));
    self
  }

  pub fn uptime_seconds(&self) -> u64 {
    self.start_time.elapsed().as_secs()
  }

  pub fn today(&self) -> NaiveDate {
    Local::now().date_naive()
  }

  pub fn now(&self) -> NaiveDateTime {
    Local::now().naive_local()
  }

  pub fn backup_manager(&self) -> ApiResult<Arc<BackupManager>> {
    self.backups
        .clone()
        .ok_or_else(|| ApiError::BadRequest("Backup disponível apenas para bancos SQLite em arquivo".to_string()))
  }
}

/// Roda código síncrono (Diesel, calamine) fora das threads do runtime.
pub async fn blocking<T, F>(f: F) -> ApiResult<T>
  where F: FnOnce() -> ApiResult<T> + Send + 'static,
        T: Send + 'static
{
  tokio::task::spawn_blocking(f).await
                                .map_err(|e| ApiError::Internal(format!("tarefa interrompida: {}", e)))?
}
