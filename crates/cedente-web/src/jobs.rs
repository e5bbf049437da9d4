//! Tarefas periódicas do servidor: verificação de notificações e backup
//! diário do SQLite.
use chrono::{Duration as ChronoDuration, Local, NaiveDateTime, NaiveTime};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval};

use crate::state::AppState;

pub const DAILY_BACKUP_REASON: &str = "automatico_diario";

/// Tempo até a próxima ocorrência de `hour:00` depois de `now`.
pub fn next_backup_delay(now: NaiveDateTime, hour: u32) -> Duration {
  let at = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or_default();
  let mut next = now.date().and_time(at);
  if next <= now {
    next += ChronoDuration::days(1);
  }
  (next - now).to_std().unwrap_or(Duration::ZERO)
}

/// Inicia as tarefas conforme a configuração. Nada é iniciado quando
/// `enable_background_jobs` está desligado.
pub fn spawn_background_jobs(state: &AppState) -> Vec<JoinHandle<()>> {
  if !state.config.enable_background_jobs {
    log::info!("tarefas em segundo plano desativadas");
    return Vec::new();
  }
  let mut handles = vec![tokio::spawn(notification_loop(state.clone()))];
  if state.backups.is_some() {
    handles.push(tokio::spawn(backup_loop(state.clone())));
  }
  handles
}

/// Primeiro disparo só depois de um intervalo completo.
fn notification_ticker(period: Duration) -> Interval {
  interval_at(Instant::now() + period, period)
}

async fn notification_loop(state: AppState) {
  let mut ticker = notification_ticker(Duration::from_secs(state.config.notification_interval_secs));
  loop {
    ticker.tick().await;
    let svc = state.service.clone();
    let now = state.now();
    match tokio::task::spawn_blocking(move || svc.run_notification_checks(now)).await {
      Ok(Ok(report)) => {
        log::info!("verificação de notificações: {} criada(s), {} antiga(s) removida(s)",
                   report.total_created(),
                   report.removidas)
      }
      Ok(Err(e)) => log::error!("falha na verificação de notificações: {}", e),
      Err(e) => log::error!("tarefa de notificações interrompida: {}", e),
    }
  }
}

async fn backup_loop(state: AppState) {
  let Some(manager) = state.backups.clone() else { return };
  loop {
    let delay = next_backup_delay(Local::now().naive_local(), state.config.backup_hour);
    log::debug!("próximo backup automático em {}s", delay.as_secs());
    tokio::time::sleep(delay).await;
    let m = manager.clone();
    match tokio::task::spawn_blocking(move || m.create(DAILY_BACKUP_REASON)).await {
      Ok(Ok(info)) => log::info!("backup automático criado: {}", info.filename),
      Ok(Err(e)) => log::error!("falha no backup automático: {}", e),
      Err(e) => log::error!("tarefa de backup interrompida: {}", e),
    }
    // evita dois backups no mesmo minuto se o relógio voltar
    tokio::time::sleep(Duration::from_secs(60)).await;
  }
}
