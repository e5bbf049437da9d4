//! Etapa de gravação da importação de planilhas: cada linha já normalizada
//! é inserida ou atualizada pelo CPF/CNPJ.
use crate::cedente::validate_nome;
use crate::{CedenteRepository, ContractStatus, Documento, DomainError, NewCedente};
use chrono::NaiveDate;
use serde::Serialize;

/// Linha de planilha já normalizada (ver `cedente-sheets`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportRow {
  /// Número da linha na planilha (1 = primeira linha).
  pub row_number: usize,
  pub nome: Option<String>,
  pub cpf_cnpj: Option<String>,
  pub status: Option<ContractStatus>,
  pub validade_contrato: Option<NaiveDate>,
  pub observacoes: Option<String>,
  /// Avisos gerados na normalização (data ou status não reconhecidos).
  pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
  pub linha: usize,
  pub mensagem: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
  pub total_rows: usize,
  pub created: usize,
  pub updated: usize,
  pub skipped: Vec<RowIssue>,
  pub errors: Vec<RowIssue>,
  pub warnings: Vec<RowIssue>,
}

impl ImportReport {
  pub fn processed(&self) -> usize {
    self.created + self.updated
  }

  pub fn message(&self) -> String {
    format!("Importação concluída! {} cedentes criados, {} atualizados, {} linhas ignoradas, {} erros.",
            self.created,
            self.updated,
            self.skipped.len(),
            self.errors.len())
  }
}

enum Outcome {
  Created,
  Updated,
}

/// Grava as linhas em ordem. Linhas sem nome ou sem documento são
/// ignoradas; documento inválido ou falha de banco vira erro daquela linha
/// e a importação continua. Documentos repetidos no mesmo arquivo
/// atualizam o registro criado pela linha anterior.
pub fn apply_rows(repo: &dyn CedenteRepository, rows: Vec<ImportRow>) -> ImportReport {
  let mut report = ImportReport { total_rows: rows.len(), ..Default::default() };
  for row in rows {
    let linha = row.row_number;
    for w in &row.warnings {
      report.warnings.push(RowIssue { linha, mensagem: w.clone() });
    }
    let (nome, doc) = match (row.nome.as_deref().map(str::trim), row.cpf_cnpj.as_deref().map(str::trim)) {
      (Some(n), Some(d)) if !n.is_empty() && !d.is_empty() => (n.to_string(), d.to_string()),
      _ => {
        report.skipped.push(RowIssue { linha, mensagem: "Linha sem nome ou sem CPF/CNPJ".to_string() });
        continue;
      }
    };
    match upsert(repo, &nome, &doc, &row) {
      Ok(Outcome::Created) => report.created += 1,
      Ok(Outcome::Updated) => report.updated += 1,
      Err(e) => {
        log::warn!("importação: linha {} rejeitada: {}", linha, e);
        report.errors.push(RowIssue { linha, mensagem: e.to_string() });
      }
    }
  }
  log::info!("{}", report.message());
  report
}

fn upsert(repo: &dyn CedenteRepository, nome: &str, doc: &str, row: &ImportRow) -> Result<Outcome, DomainError> {
  let nome = validate_nome(nome)?;
  let documento = Documento::parse(doc)?;
  match repo.find_by_documento(&documento)? {
    Some(existing) => {
      let data = NewCedente { nome_razao_social: nome,
                              cpf_cnpj: documento,
                              status: row.status.unwrap_or(existing.status),
                              validade_contrato: row.validade_contrato.or(existing.validade_contrato),
                              observacoes: row.observacoes.clone().or(existing.observacoes) };
      repo.update(existing.id, data)?
          .ok_or_else(|| DomainError::NotFound(format!("cedente {} removido durante a importação", existing.id)))?;
      Ok(Outcome::Updated)
    }
    None => {
      let data = NewCedente { nome_razao_social: nome,
                              cpf_cnpj: documento,
                              status: row.status.unwrap_or_default(),
                              validade_contrato: row.validade_contrato,
                              observacoes: row.observacoes.clone() };
      repo.create(data)?;
      Ok(Outcome::Created)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{CedenteFilter, InMemoryCedenteRepository};

  fn row(n: usize, nome: &str, doc: &str) -> ImportRow {
    ImportRow { row_number: n, nome: Some(nome.into()), cpf_cnpj: Some(doc.into()), ..Default::default() }
  }

  #[test]
  fn creates_updates_and_skips() -> Result<(), DomainError> {
    let repo = InMemoryCedenteRepository::new();
    let mut r3 = row(3, "Maria Silva", "52998224725");
    r3.status = Some(ContractStatus::AssinadoManual);
    r3.validade_contrato = NaiveDate::from_ymd_opt(2026, 5, 1);
    let rows = vec![r3,
                    row(4, "Acme Ltda", "11222333000181"),
                    ImportRow { row_number: 5, nome: Some("Sem doc".into()), ..Default::default() },
                    row(6, "Inválido", "12345678900"),
                    // same document again: later row updates the earlier one but keeps status/date
                    row(7, "Maria S. Souza", "529.982.247-25")];
    let report = apply_rows(&repo, rows);
    assert_eq!(report.total_rows, 5);
    assert_eq!(report.created, 2);
    assert_eq!(report.updated, 1);
    assert_eq!(report.skipped, vec![RowIssue { linha: 5, mensagem: "Linha sem nome ou sem CPF/CNPJ".into() }]);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].linha, 6);

    let maria = repo.find_by_documento(&Documento::parse("52998224725")?)?.expect("maria");
    assert_eq!(maria.nome_razao_social, "Maria S. Souza");
    assert_eq!(maria.status, ContractStatus::AssinadoManual);
    assert_eq!(maria.validade_contrato, NaiveDate::from_ymd_opt(2026, 5, 1));

    let acme = repo.find_by_documento(&Documento::parse("11222333000181")?)?.expect("acme");
    assert_eq!(acme.status, ContractStatus::SemAssinatura);
    assert_eq!(repo.list(&CedenteFilter::default())?.len(), 2);
    Ok(())
  }

  #[test]
  fn warnings_are_carried_into_the_report() {
    let repo = InMemoryCedenteRepository::new();
    let mut r = row(2, "Maria Silva", "52998224725");
    r.warnings.push("Data de validade não reconhecida: 32/13/2025".into());
    let report = apply_rows(&repo, vec![r]);
    assert_eq!(report.created, 1);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].linha, 2);
    assert!(report.message().contains("1 cedentes criados"));
  }
}
