// cedente.rs
use crate::dates::parse_date;
use crate::text::{collapse_whitespace, fold};
use crate::{ContractStatus, DocumentChecklist, Documento, DomainError};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub const NOME_MIN_LEN: usize = 2;
pub const NOME_MAX_LEN: usize = 255;
/// Janela padrão (em dias) para considerar um contrato "próximo do vencimento".
pub const DEFAULT_EXPIRY_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cedente {
  pub id: i32,
  pub nome_razao_social: String,
  pub cpf_cnpj: Documento,
  pub status: ContractStatus,
  pub validade_contrato: Option<NaiveDate>,
  pub observacoes: Option<String>,
  pub documentos: DocumentChecklist,
  pub created_at: NaiveDateTime,
  pub updated_at: NaiveDateTime,
}

impl Cedente {
  /// Dias corridos até a validade; negativo quando já venceu.
  pub fn days_until_expiry(&self, today: NaiveDate) -> Option<i64> {
    self.validade_contrato.map(|d| (d - today).num_days())
  }

  pub fn expiry_status(&self, today: NaiveDate, window_days: i64) -> ExpiryStatus {
    ExpiryStatus::classify(self.validade_contrato, today, window_days)
  }

  /// Busca por nome (sem acentos/maiúsculas) ou por dígitos do documento.
  pub fn matches(&self, filter: &CedenteFilter) -> bool {
    if let Some(status) = filter.status {
      if self.status != status {
        return false;
      }
    }
    match filter.search.as_deref().map(str::trim) {
      None | Some("") => true,
      Some(term) => {
        let folded = fold(term);
        let digits: String = term.chars().filter(|c| c.is_ascii_digit()).collect();
        (!folded.is_empty() && fold(&self.nome_razao_social).contains(&folded))
        || (!digits.is_empty() && self.cpf_cnpj.digits().contains(&digits))
      }
    }
  }

  /// Chave de ordenação da listagem: nome sem espaços nas pontas, minúsculo.
  pub fn sort_key(&self) -> (String, i32) {
    (self.nome_razao_social.trim().to_lowercase(), self.id)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStatus {
  SemData,
  Vencido,
  Proximo,
  Ok,
}

impl ExpiryStatus {
  pub fn classify(validade: Option<NaiveDate>, today: NaiveDate, window_days: i64) -> Self {
    match validade.map(|d| (d - today).num_days()) {
      None => ExpiryStatus::SemData,
      Some(days) if days < 0 => ExpiryStatus::Vencido,
      Some(days) if days <= window_days => ExpiryStatus::Proximo,
      Some(_) => ExpiryStatus::Ok,
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      ExpiryStatus::SemData => "Sem data",
      ExpiryStatus::Vencido => "Vencido",
      ExpiryStatus::Proximo => "Próximo do vencimento",
      ExpiryStatus::Ok => "Em dia",
    }
  }
}

/// Dados validados para criar ou atualizar um cedente.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCedente {
  pub nome_razao_social: String,
  pub cpf_cnpj: Documento,
  pub status: ContractStatus,
  pub validade_contrato: Option<NaiveDate>,
  pub observacoes: Option<String>,
}

impl NewCedente {
  pub fn new(nome: &str, cpf_cnpj: &str) -> Result<Self, DomainError> {
    Ok(Self { nome_razao_social: validate_nome(nome)?,
              cpf_cnpj: Documento::parse(cpf_cnpj)?,
              status: ContractStatus::default(),
              validade_contrato: None,
              observacoes: None })
  }

  pub fn with_status(mut self, status: ContractStatus) -> Self {
    self.status = status;
    self
  }

  pub fn with_validade(mut self, validade: Option<NaiveDate>) -> Self {
    self.validade_contrato = validade;
    self
  }

  pub fn with_observacoes(mut self, obs: Option<String>) -> Self {
    self.observacoes = normalize_observacoes(obs);
    self
  }
}

/// Corpo recebido pela API (formulário do painel ou JSON).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CedenteInput {
  #[serde(alias = "nome_razao_social")]
  pub nome: Option<String>,
  pub cpf_cnpj: Option<String>,
  #[serde(alias = "status")]
  pub contrato: Option<String>,
  #[serde(alias = "data_validade")]
  pub validade_contrato: Option<String>,
  pub observacoes: Option<String>,
}

impl CedenteInput {
  pub fn validate(self) -> Result<NewCedente, DomainError> {
    let nome = self.nome.unwrap_or_default();
    let doc = self.cpf_cnpj.unwrap_or_default();
    let status = match self.contrato.as_deref().map(str::trim) {
      None | Some("") => ContractStatus::default(),
      Some(raw) => raw.parse()?,
    };
    let validade = match self.validade_contrato.as_deref().map(str::trim) {
      None | Some("") => None,
      Some(raw) => {
        Some(parse_date(raw).ok_or_else(|| DomainError::ValidationError(format!("Data de validade inválida: {}", raw)))?)
      }
    };
    Ok(NewCedente::new(&nome, &doc)?.with_status(status).with_validade(validade).with_observacoes(self.observacoes))
  }
}

pub fn validate_nome(raw: &str) -> Result<String, DomainError> {
  let nome = collapse_whitespace(raw);
  if nome.is_empty() {
    return Err(DomainError::ValidationError("Nome/Razão Social é obrigatório".to_string()));
  }
  let len = nome.chars().count();
  if !(NOME_MIN_LEN..=NOME_MAX_LEN).contains(&len) {
    return Err(DomainError::ValidationError(format!("Nome deve ter entre {} e {} caracteres",
                                                    NOME_MIN_LEN, NOME_MAX_LEN)));
  }
  Ok(nome)
}

fn normalize_observacoes(obs: Option<String>) -> Option<String> {
  obs.map(|o| o.trim().to_string()).filter(|o| !o.is_empty())
}

/// Filtro da listagem e da exportação filtrada.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CedenteFilter {
  pub search: Option<String>,
  pub status: Option<ContractStatus>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample(validade: Option<NaiveDate>) -> Cedente {
    let now = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
    Cedente { id: 1,
              nome_razao_social: "Padaria São João Ltda".into(),
              cpf_cnpj: Documento::parse("11.222.333/0001-81").unwrap(),
              status: ContractStatus::AssinadoManual,
              validade_contrato: validade,
              observacoes: None,
              documentos: DocumentChecklist::default(),
              created_at: now,
              updated_at: now }
  }

  #[test]
  fn expiry_classification() {
    let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    let at = |days: i64| Some(today + chrono::Duration::days(days));
    assert_eq!(ExpiryStatus::classify(None, today, 30), ExpiryStatus::SemData);
    assert_eq!(ExpiryStatus::classify(at(-1), today, 30), ExpiryStatus::Vencido);
    assert_eq!(ExpiryStatus::classify(at(0), today, 30), ExpiryStatus::Proximo);
    assert_eq!(ExpiryStatus::classify(at(30), today, 30), ExpiryStatus::Proximo);
    assert_eq!(ExpiryStatus::classify(at(31), today, 30), ExpiryStatus::Ok);
    assert_eq!(sample(at(-10)).days_until_expiry(today), Some(-10));
  }

  #[test]
  fn search_matches_name_without_accents_and_document_digits() {
    let c = sample(None);
    let by = |s: &str| CedenteFilter { search: Some(s.into()), status: None };
    assert!(c.matches(&by("sao joao")));
    assert!(c.matches(&by("PADARIA")));
    assert!(c.matches(&by("11.222")));
    assert!(!c.matches(&by("mercado")));
    assert!(c.matches(&CedenteFilter::default()));
    assert!(!c.matches(&CedenteFilter { search: None, status: Some(ContractStatus::LevouContrato) }));
  }

  #[test]
  fn input_validation() {
    let ok = CedenteInput { nome: Some("  Maria   Silva ".into()),
                            cpf_cnpj: Some("529.982.247-25".into()),
                            contrato: Some("levou_contrato".into()),
                            validade_contrato: Some("31/12/2026".into()),
                            observacoes: Some("   ".into()) }.validate()
                                                             .unwrap();
    assert_eq!(ok.nome_razao_social, "Maria Silva");
    assert_eq!(ok.status, ContractStatus::LevouContrato);
    assert_eq!(ok.validade_contrato, NaiveDate::from_ymd_opt(2026, 12, 31));
    assert_eq!(ok.observacoes, None);

    let default_status = CedenteInput { nome: Some("Maria".into()),
                                        cpf_cnpj: Some("52998224725".into()),
                                        ..Default::default() }.validate()
                                                              .unwrap();
    assert_eq!(default_status.status, ContractStatus::SemAssinatura);

    let short = CedenteInput { nome: Some("M".into()), cpf_cnpj: Some("52998224725".into()), ..Default::default() };
    assert!(matches!(short.validate(), Err(DomainError::ValidationError(_))));
    let bad_status = CedenteInput { nome: Some("Maria".into()),
                                    cpf_cnpj: Some("52998224725".into()),
                                    contrato: Some("xyz".into()),
                                    ..Default::default() };
    assert!(bad_status.validate().is_err());
    let bad_date = CedenteInput { nome: Some("Maria".into()),
                                  cpf_cnpj: Some("52998224725".into()),
                                  validade_contrato: Some("ontem".into()),
                                  ..Default::default() };
    assert!(bad_date.validate().is_err());
  }
}
