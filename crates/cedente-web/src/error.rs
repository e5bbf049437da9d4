//! Erros da API e o corpo JSON devolvido ao cliente.
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cedente_domain::DomainError;
use cedente_persistence::BackupError;
use cedente_sheets::SheetError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("{0}")]
  Validation(String),
  #[error("{0}")]
  NotFound(String),
  #[error("{0}")]
  Conflict(String),
  #[error("Arquivo excede o tamanho máximo de {0} MB")]
  PayloadTooLarge(usize),
  #[error("{0}")]
  UnsupportedMedia(String),
  #[error("Requisição inválida: {0}")]
  BadRequest(String),
  #[error("Erro interno: {0}")]
  Internal(String),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, error_type) = match &self {
      ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
      ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
      ApiError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
      ApiError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
      ApiError::UnsupportedMedia(_) => (StatusCode::UNSUPPORTED_MEDIA_TYPE, "unsupported_media_type"),
      ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
      ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    };
    if status.is_server_error() {
      log::error!("{}", self);
    }

    let body = Json(json!({
      "success": false,
      "error": {
        "type": error_type,
        "message": self.to_string(),
      }
    }));

    (status, body).into_response()
  }
}

impl From<DomainError> for ApiError {
  fn from(e: DomainError) -> Self {
    match e {
      DomainError::ValidationError(m) => ApiError::Validation(m),
      DomainError::NotFound(m) => ApiError::NotFound(m),
      DomainError::Conflict(m) => ApiError::Conflict(m),
      DomainError::ExternalError(m) | DomainError::SerializationError(m) => ApiError::Internal(m),
    }
  }
}

impl From<SheetError> for ApiError {
  fn from(e: SheetError) -> Self {
    match e {
      SheetError::UnsupportedFormat(_) => ApiError::UnsupportedMedia(e.to_string()),
      SheetError::EmptyWorkbook | SheetError::Read(_) | SheetError::UnknownColumn(_) => {
        ApiError::Validation(e.to_string())
      }
      SheetError::Write(m) => ApiError::Internal(m),
    }
  }
}

impl From<BackupError> for ApiError {
  fn from(e: BackupError) -> Self {
    match e {
      BackupError::Unsupported | BackupError::InvalidName(_) => ApiError::BadRequest(e.to_string()),
      BackupError::NotFound(_) => ApiError::NotFound(e.to_string()),
      BackupError::Database(_) | BackupError::Io(_) => ApiError::Internal(e.to_string()),
    }
  }
}

pub type ApiResult<T> = Result<T, ApiError>;
