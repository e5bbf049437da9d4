// status.rs
use crate::text::fold;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Situação do contrato de um cedente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
  AssinadoManual,
  #[default]
  SemAssinatura,
  PrecisaRenovar,
  FaltamAssinar,
  AvisadosRenovacao,
  LevouContrato,
  PontosAtencao,
}

impl ContractStatus {
  pub const ALL: [ContractStatus; 7] = [ContractStatus::AssinadoManual,
                                        ContractStatus::SemAssinatura,
                                        ContractStatus::PrecisaRenovar,
                                        ContractStatus::FaltamAssinar,
                                        ContractStatus::AvisadosRenovacao,
                                        ContractStatus::LevouContrato,
                                        ContractStatus::PontosAtencao];

  /// Chave estável usada no banco e na API.
  pub fn key(&self) -> &'static str {
    match self {
      ContractStatus::AssinadoManual => "assinado_manual",
      ContractStatus::SemAssinatura => "sem_assinatura",
      ContractStatus::PrecisaRenovar => "precisa_renovar",
      ContractStatus::FaltamAssinar => "faltam_assinar",
      ContractStatus::AvisadosRenovacao => "avisados_renovacao",
      ContractStatus::LevouContrato => "levou_contrato",
      ContractStatus::PontosAtencao => "pontos_atencao",
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      ContractStatus::AssinadoManual => "Contrato assinado manualmente",
      ContractStatus::SemAssinatura => "Contrato sem assinatura manual e digital",
      ContractStatus::PrecisaRenovar => "Contrato precisa ser renovado",
      ContractStatus::FaltamAssinar => "Contratos impressos que faltam assinar",
      ContractStatus::AvisadosRenovacao => "Cedentes que já foram avisados da renovação",
      ContractStatus::LevouContrato => "Levou o contrato para assinar",
      ContractStatus::PontosAtencao => "Pontos de atenção",
    }
  }

  pub fn from_key(key: &str) -> Option<Self> {
    Self::ALL.iter().copied().find(|s| s.key() == key)
  }

  /// Interpreta um status escrito livremente: chave, rótulo, rótulos antigos
  /// em maiúsculas ou texto com as palavras-chave de cada situação.
  /// Comparação sem diferenciar maiúsculas nem acentos.
  pub fn parse(raw: &str) -> Option<Self> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
      return None;
    }
    if let Some(s) = Self::from_key(&trimmed.to_lowercase()) {
      return Some(s);
    }
    let folded = fold(trimmed);
    if let Some(s) = Self::ALL.iter().copied().find(|s| fold(s.label()) == folded || fold(s.key()) == folded) {
      return Some(s);
    }
    let has = |word: &str| folded.contains(word);
    // order matters: "sem assinatura" and "renovacao" labels also mention "assinad"
    if has("avisad") && has("renov") {
      Some(ContractStatus::AvisadosRenovacao)
    } else if has("renov") {
      Some(ContractStatus::PrecisaRenovar)
    } else if has("sem assinatura") {
      Some(ContractStatus::SemAssinatura)
    } else if has("faltam") || has("impress") {
      Some(ContractStatus::FaltamAssinar)
    } else if has("levou") {
      Some(ContractStatus::LevouContrato)
    } else if has("atencao") {
      Some(ContractStatus::PontosAtencao)
    } else if has("assinado") {
      Some(ContractStatus::AssinadoManual)
    } else {
      None
    }
  }
}

impl fmt::Display for ContractStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.label())
  }
}

impl FromStr for ContractStatus {
  type Err = crate::DomainError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::parse(s).ok_or_else(|| crate::DomainError::ValidationError(format!("Status inválido: {}", s)))
  }
}
