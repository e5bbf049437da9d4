// service.rs
use crate::import::{apply_rows, ImportReport, ImportRow};
use crate::notifications::{run_checks, NotificationCheckReport};
use crate::stats::{dashboard, DashboardStats};
use crate::{Cedente, CedenteFilter, CedenteInput, CedenteRepository, DocumentChecklist, DomainError, Notification};
use chrono::{NaiveDate, NaiveDateTime};
use std::sync::Arc;

/// Casos de uso do cadastro sobre um repositório qualquer.
///
/// Valida a entrada e traduz "não existe" em `DomainError::NotFound`, de
/// modo que a camada HTTP só precisa mapear erros.
#[derive(Clone)]
pub struct CedenteService {
  repo: Arc<dyn CedenteRepository>,
}

impl CedenteService {
  pub fn new(repo: Arc<dyn CedenteRepository>) -> Self {
    Self { repo }
  }

  pub fn list(&self, filter: &CedenteFilter) -> Result<Vec<Cedente>, DomainError> {
    self.repo.list(filter)
  }

  pub fn get(&self, id: i32) -> Result<Cedente, DomainError> {
    self.repo.get(id)?.ok_or_else(|| not_found(id))
  }

  pub fn create(&self, input: CedenteInput) -> Result<Cedente, DomainError> {
    let data = input.validate()?;
    let created = self.repo.create(data)?;
    log::info!("cedente {} criado ({})", created.id, created.cpf_cnpj.formatted());
    Ok(created)
  }

  /// Status vazio na entrada mantém o status atual.
  pub fn update(&self, id: i32, input: CedenteInput) -> Result<Cedente, DomainError> {
    let keep_status = input.contrato.as_deref().map(str::trim).unwrap_or("").is_empty();
    let mut data = input.validate()?;
    if keep_status {
      data.status = self.get(id)?.status;
    }
    self.repo.update(id, data)?.ok_or_else(|| not_found(id))
  }

  pub fn delete(&self, id: i32) -> Result<(), DomainError> {
    if self.repo.delete(id)? {
      log::info!("cedente {} excluído", id);
      Ok(())
    } else {
      Err(not_found(id))
    }
  }

  pub fn delete_all(&self) -> Result<usize, DomainError> {
    let removed = self.repo.delete_all()?;
    log::warn!("todos os cedentes excluídos ({})", removed);
    Ok(removed)
  }

  pub fn documents(&self, id: i32) -> Result<DocumentChecklist, DomainError> {
    self.repo.get_documents(id)?.ok_or_else(|| not_found(id))
  }

  pub fn save_documents(&self, id: i32, documents: &DocumentChecklist) -> Result<DocumentChecklist, DomainError> {
    if !self.repo.save_documents(id, documents)? {
      return Err(not_found(id));
    }
    Ok(*documents)
  }

  pub fn import(&self, rows: Vec<ImportRow>) -> ImportReport {
    apply_rows(self.repo.as_ref(), rows)
  }

  pub fn dashboard(&self, today: NaiveDate, window_days: i64) -> Result<DashboardStats, DomainError> {
    dashboard(self.repo.as_ref(), today, window_days)
  }

  pub fn unread_notifications(&self) -> Result<Vec<Notification>, DomainError> {
    self.repo.unread_notifications()
  }

  pub fn mark_notification_read(&self, id: i32) -> Result<(), DomainError> {
    if self.repo.mark_notification_read(id)? {
      Ok(())
    } else {
      Err(DomainError::NotFound(format!("Notificação {} não encontrada", id)))
    }
  }

  pub fn mark_all_notifications_read(&self) -> Result<usize, DomainError> {
    self.repo.mark_all_notifications_read()
  }

  pub fn run_notification_checks(&self, now: NaiveDateTime) -> Result<NotificationCheckReport, DomainError> {
    run_checks(self.repo.as_ref(), now)
  }
}

fn not_found(id: i32) -> DomainError {
  DomainError::NotFound(format!("Cedente {} não encontrado", id))
}
