//! Handlers HTTP, um módulo por grupo de rotas.
pub mod backup;
pub mod cedentes;
pub mod dashboard;
pub mod documentos;
pub mod health;
pub mod notificacoes;
pub mod planilhas;

use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};

/// Query string de listagem e exportação filtrada.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
  pub search: Option<String>,
  pub status: Option<String>,
  pub colunas: Option<String>,
}

impl ListQuery {
  pub fn filter(&self) -> ApiResult<cedente_domain::CedenteFilter> {
    let status = match self.status.as_deref().map(str::trim) {
      None | Some("") | Some("todos") => None,
      Some(raw) => Some(raw.parse::<cedente_domain::ContractStatus>()?),
    };
    let search = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
    Ok(cedente_domain::CedenteFilter { search, status })
  }
}

pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
  body.map(|Json(v)| v).map_err(|e| ApiError::BadRequest(e.body_text()))
}
