// notifications.rs
use crate::{CedenteFilter, CedenteRepository, DomainError};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
  Vencimento,
  VencimentoUrgencia,
  DocumentosPendentes,
}

impl NotificationKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      NotificationKind::Vencimento => "vencimento",
      NotificationKind::VencimentoUrgencia => "vencimento_urgencia",
      NotificationKind::DocumentosPendentes => "documentos_pendentes",
    }
  }
}

impl FromStr for NotificationKind {
  type Err = DomainError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "vencimento" => Ok(NotificationKind::Vencimento),
      "vencimento_urgencia" => Ok(NotificationKind::VencimentoUrgencia),
      "documentos_pendentes" => Ok(NotificationKind::DocumentosPendentes),
      other => Err(DomainError::SerializationError(format!("tipo de notificação desconhecido: {}", other))),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
  pub id: i32,
  pub cedente_id: Option<i32>,
  pub cedente_nome: Option<String>,
  #[serde(rename = "tipo")]
  pub kind: NotificationKind,
  pub titulo: String,
  pub mensagem: String,
  pub lida: bool,
  #[serde(rename = "data_criacao")]
  pub created_at: NaiveDateTime,
  pub data_vencimento: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
  pub cedente_id: Option<i32>,
  pub kind: NotificationKind,
  pub titulo: String,
  pub mensagem: String,
  pub data_vencimento: Option<NaiveDate>,
}

/// Dias antes do vencimento em que um aviso é gerado.
pub const AVISO_DIAS: [i64; 3] = [30, 15, 7];
/// Notificações lidas mais antigas que isso são apagadas a cada verificação.
pub const RETENCAO_LIDAS_DIAS: i64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotificationCheckReport {
  pub vencimento: usize,
  pub vencidos: usize,
  pub documentos_pendentes: usize,
  pub removidas: usize,
}

impl NotificationCheckReport {
  pub fn total_created(&self) -> usize {
    self.vencimento + self.vencidos + self.documentos_pendentes
  }
}

/// Gera avisos de vencimento e de checklist incompleto, sem repetir um
/// aviso ainda não lido, e apaga as notificações lidas antigas.
///
/// `now` é hora local, o mesmo relógio com que os repositórios gravam
/// `created_at`.
pub fn run_checks(repo: &dyn CedenteRepository, now: NaiveDateTime) -> Result<NotificationCheckReport, DomainError> {
  let today = now.date();
  let mut report = NotificationCheckReport::default();
  for c in repo.list(&CedenteFilter::default())? {
    if let (Some(validade), Some(days)) = (c.validade_contrato, c.days_until_expiry(today)) {
      let aviso = if days < 0 {
        Some((NotificationKind::VencimentoUrgencia,
              "Contrato vencido".to_string(),
              format!("O contrato de {} venceu em {}.", c.nome_razao_social, crate::dates::format_br(validade))))
      } else if AVISO_DIAS.contains(&days) {
        Some((NotificationKind::Vencimento,
              format!("Contrato vence em {} dias", days),
              format!("O contrato de {} vence em {}.", c.nome_razao_social, crate::dates::format_br(validade))))
      } else {
        None
      };
      if let Some((kind, titulo, mensagem)) = aviso {
        if !repo.has_unread_notification(c.id, kind, Some(validade))? {
          repo.create_notification(NewNotification { cedente_id: Some(c.id),
                                                     kind,
                                                     titulo,
                                                     mensagem,
                                                     data_vencimento: Some(validade) })?;
          match kind {
            NotificationKind::VencimentoUrgencia => report.vencidos += 1,
            _ => report.vencimento += 1,
          }
        }
      }
    }

    if !c.documentos.is_complete()
       && !repo.has_unread_notification(c.id, NotificationKind::DocumentosPendentes, None)?
    {
      let faltando = c.documentos.missing();
      repo.create_notification(NewNotification { cedente_id: Some(c.id),
                                                 kind: NotificationKind::DocumentosPendentes,
                                                 titulo: "Documentos pendentes".to_string(),
                                                 mensagem: format!("{} tem {} documento(s) pendente(s): {}.",
                                                                   c.nome_razao_social,
                                                                   faltando.len(),
                                                                   faltando.join(", ")),
                                                 data_vencimento: None })?;
      report.documentos_pendentes += 1;
    }
  }
  report.removidas = repo.purge_read_notifications(now - Duration::days(RETENCAO_LIDAS_DIAS))?;
  log::info!("verificação de notificações: {} criadas, {} removidas",
             report.total_created(),
             report.removidas);
  Ok(report)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{DocumentChecklist, InMemoryCedenteRepository, NewCedente};

  fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(9, 0, 0).unwrap()
  }

  #[test]
  fn creates_expiry_and_checklist_notifications_once() -> Result<(), DomainError> {
    let repo = InMemoryCedenteRepository::new();
    let now = at(2025, 6, 1);
    let today = now.date();
    let em15 = repo.create(NewCedente::new("Quinze Dias", "52998224725")?.with_validade(Some(today + Duration::days(15))))?;
    let vencido = repo.create(NewCedente::new("Vencido", "11144477735")?.with_validade(Some(today - Duration::days(3))))?;
    let em20 = repo.create(NewCedente::new("Vinte Dias", "11222333000181")?.with_validade(Some(today + Duration::days(20))))?;
    for c in [&em15, &vencido, &em20] {
      repo.save_documents(c.id, &DocumentChecklist::all_delivered())?;
    }
    repo.create(NewCedente::new("Sem Documentos", "04252011000110")?)?;

    let first = run_checks(&repo, now)?;
    assert_eq!(first.vencimento, 1);
    assert_eq!(first.vencidos, 1);
    assert_eq!(first.documentos_pendentes, 1);

    let unread = repo.unread_notifications()?;
    assert_eq!(unread.len(), 3);
    assert!(unread.iter().any(|n| n.titulo == "Contrato vence em 15 dias" && n.cedente_id == Some(em15.id)));
    assert!(unread.iter().any(|n| n.titulo == "Contrato vencido" && n.cedente_id == Some(vencido.id)));
    assert!(unread.iter().all(|n| n.cedente_id != Some(em20.id)));

    let second = run_checks(&repo, now)?;
    assert_eq!(second.total_created(), 0);
    assert_eq!(repo.count_unread_notifications()?, 3);
    Ok(())
  }

  #[test]
  fn purges_old_read_notifications() -> Result<(), DomainError> {
    let repo = InMemoryCedenteRepository::new();
    repo.create(NewCedente::new("Sem Documentos", "04252011000110")?)?;
    let now = chrono::Local::now().naive_local();
    run_checks(&repo, now)?;
    assert_eq!(repo.mark_all_notifications_read()?, 1);

    let report = run_checks(&repo, now + Duration::days(RETENCAO_LIDAS_DIAS - 1))?;
    assert_eq!(report.removidas, 0);
    assert_eq!(report.documentos_pendentes, 1);
    repo.mark_all_notifications_read()?;

    // lidas há mais de 30 dias: removidas
    let report = run_checks(&repo, now + Duration::days(RETENCAO_LIDAS_DIAS + 10))?;
    assert_eq!(report.removidas, 2);
    assert_eq!(report.documentos_pendentes, 1);
    Ok(())
  }

  #[test]
  fn purge_cutoff_uses_the_same_clock_as_creation() -> Result<(), DomainError> {
    let repo = InMemoryCedenteRepository::new();
    repo.create_notification(NewNotification { cedente_id: None,
                                               kind: NotificationKind::Vencimento,
                                               titulo: "Contrato vence em 30 dias".into(),
                                               mensagem: "Aviso".into(),
                                               data_vencimento: None })?;
    repo.mark_all_notifications_read()?;
    let now = chrono::Local::now().naive_local();

    let antes = run_checks(&repo, now + Duration::days(RETENCAO_LIDAS_DIAS) - Duration::minutes(5))?;
    assert_eq!(antes.removidas, 0);
    let depois = run_checks(&repo, now + Duration::days(RETENCAO_LIDAS_DIAS) + Duration::minutes(5))?;
    assert_eq!(depois.removidas, 1);
    Ok(())
  }
}
