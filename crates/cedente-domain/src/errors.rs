// errors.rs
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
  #[error("Erro de validação: {0}")]
  ValidationError(String),
  #[error("Não encontrado: {0}")]
  NotFound(String),
  #[error("Conflito: {0}")]
  Conflict(String),
  #[error("Erro externo: {0}")]
  ExternalError(String),
  #[error("Erro de serialização: {0}")]
  SerializationError(String),
}

impl From<serde_json::Error> for DomainError {
  fn from(e: serde_json::Error) -> Self {
    Self::SerializationError(e.to_string())
  }
}
