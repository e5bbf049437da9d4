// stats.rs
use crate::{CedenteFilter, CedenteRepository, ContractStatus, DomainError, ExpiryStatus};
use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
  pub status: ContractStatus,
  pub label: &'static str,
  pub total: i64,
}

/// Números exibidos no painel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
  pub total_cedentes: usize,
  pub por_status: Vec<StatusCount>,
  pub contratos_vencidos: usize,
  pub contratos_proximos: usize,
  pub contratos_sem_data: usize,
  pub documentos_completos: usize,
  pub documentos_pendentes: usize,
  pub notificacoes_nao_lidas: i64,
}

/// Calcula as estatísticas do painel. `por_status` traz todas as situações,
/// inclusive as que têm zero cedentes, na ordem de `ContractStatus::ALL`.
pub fn dashboard(repo: &dyn CedenteRepository, today: NaiveDate, window_days: i64) -> Result<DashboardStats, DomainError> {
  let cedentes = repo.list(&CedenteFilter::default())?;
  let counts = repo.count_by_status()?;
  let por_status = ContractStatus::ALL.iter()
                                      .map(|s| StatusCount { status: *s,
                                                             label: s.label(),
                                                             total: counts.iter()
                                                                         .find(|(k, _)| k == s)
                                                                         .map(|(_, n)| *n)
                                                                         .unwrap_or(0) })
                                      .collect();
  let mut stats = DashboardStats { total_cedentes: cedentes.len(),
                                   por_status,
                                   contratos_vencidos: 0,
                                   contratos_proximos: 0,
                                   contratos_sem_data: 0,
                                   documentos_completos: 0,
                                   documentos_pendentes: 0,
                                   notificacoes_nao_lidas: repo.count_unread_notifications()? };
  for c in &cedentes {
    match c.expiry_status(today, window_days) {
      ExpiryStatus::Vencido => stats.contratos_vencidos += 1,
      ExpiryStatus::Proximo => stats.contratos_proximos += 1,
      ExpiryStatus::SemData => stats.contratos_sem_data += 1,
      ExpiryStatus::Ok => {}
    }
    if c.documentos.is_complete() {
      stats.documentos_completos += 1;
    } else {
      stats.documentos_pendentes += 1;
    }
  }
  Ok(stats)
}
