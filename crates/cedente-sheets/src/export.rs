use crate::SheetError;
use cedente_domain::dates::format_br;
use cedente_domain::Cedente;
use chrono::{NaiveDate, NaiveDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportColumn {
  Id,
  Nome,
  CpfCnpj,
  Contrato,
  Validade,
  SituacaoValidade,
  DocumentosCompletos,
  Observacoes,
}

impl ExportColumn {
  pub const ALL: [ExportColumn; 8] = [ExportColumn::Id,
                                      ExportColumn::Nome,
                                      ExportColumn::CpfCnpj,
                                      ExportColumn::Contrato,
                                      ExportColumn::Validade,
                                      ExportColumn::SituacaoValidade,
                                      ExportColumn::DocumentosCompletos,
                                      ExportColumn::Observacoes];

  /// Colunas usadas quando nenhuma é pedida.
  pub const DEFAULT: [ExportColumn; 7] = [ExportColumn::Nome,
                                          ExportColumn::CpfCnpj,
                                          ExportColumn::Contrato,
                                          ExportColumn::Validade,
                                          ExportColumn::SituacaoValidade,
                                          ExportColumn::DocumentosCompletos,
                                          ExportColumn::Observacoes];

  pub fn key(&self) -> &'static str {
    match self {
      ExportColumn::Id => "id",
      ExportColumn::Nome => "nome",
      ExportColumn::CpfCnpj => "cpf_cnpj",
      ExportColumn::Contrato => "contrato",
      ExportColumn::Validade => "validade",
      ExportColumn::SituacaoValidade => "situacao_validade",
      ExportColumn::DocumentosCompletos => "documentos_completos",
      ExportColumn::Observacoes => "observacoes",
    }
  }

  pub fn header(&self) -> &'static str {
    match self {
      ExportColumn::Id => "ID",
      ExportColumn::Nome => "Nome / Razão Social",
      ExportColumn::CpfCnpj => "CPF / CNPJ",
      ExportColumn::Contrato => "Contrato",
      ExportColumn::Validade => "Validade do Contrato",
      ExportColumn::SituacaoValidade => "Situação da Validade",
      ExportColumn::DocumentosCompletos => "Documentos Completos",
      ExportColumn::Observacoes => "Observações",
    }
  }

  pub fn from_key(key: &str) -> Result<Self, SheetError> {
    let key = key.trim();
    Self::ALL.iter().copied().find(|c| c.key() == key).ok_or_else(|| SheetError::UnknownColumn(key.to_string()))
  }

  fn value(&self, c: &Cedente, today: NaiveDate, window_days: i64) -> String {
    match self {
      ExportColumn::Id => c.id.to_string(),
      ExportColumn::Nome => c.nome_razao_social.clone(),
      ExportColumn::CpfCnpj => c.cpf_cnpj.formatted(),
      ExportColumn::Contrato => c.status.label().to_string(),
      ExportColumn::Validade => c.validade_contrato.map(format_br).unwrap_or_default(),
      ExportColumn::SituacaoValidade => c.expiry_status(today, window_days).label().to_string(),
      ExportColumn::DocumentosCompletos => if c.documentos.is_complete() { "Sim" } else { "Não" }.to_string(),
      ExportColumn::Observacoes => c.observacoes.clone().unwrap_or_default(),
    }
  }
}

/// Lista de colunas a partir de `colunas=nome,cpf_cnpj,...`; vazio usa
/// `ExportColumn::DEFAULT`.
pub fn parse_columns(raw: Option<&str>) -> Result<Vec<ExportColumn>, SheetError> {
  let keys: Vec<&str> = raw.unwrap_or("").split(',').map(str::trim).filter(|k| !k.is_empty()).collect();
  if keys.is_empty() {
    return Ok(ExportColumn::DEFAULT.to_vec());
  }
  let mut out = Vec::with_capacity(keys.len());
  for k in keys {
    let col = ExportColumn::from_key(k)?;
    if !out.contains(&col) {
      out.push(col);
    }
  }
  Ok(out)
}

/// CSV com BOM e `;` (abre direto no Excel em português).
pub fn export_csv(cedentes: &[Cedente],
                  columns: &[ExportColumn],
                  today: NaiveDate,
                  window_days: i64)
                  -> Result<Vec<u8>, SheetError> {
  let mut buf = Vec::new();
  buf.extend_from_slice("\u{feff}".as_bytes());
  let mut writer = csv::WriterBuilder::new().delimiter(b';').from_writer(buf);
  writer.write_record(columns.iter().map(|c| c.header())).map_err(|e| SheetError::Write(e.to_string()))?;
  for c in cedentes {
    writer.write_record(columns.iter().map(|col| col.value(c, today, window_days)))
          .map_err(|e| SheetError::Write(e.to_string()))?;
  }
  writer.into_inner().map_err(|e| SheetError::Write(e.to_string()))
}

pub fn export_filename(prefix: &str, now: NaiveDateTime) -> String {
  format!("{}_{}.csv", prefix, now.format("%Y%m%d_%H%M%S"))
}
