use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SheetError {
  #[error("Formato de arquivo não suportado: {0}. Use .xlsx, .xlsm, .xls, .ods ou .csv")]
  UnsupportedFormat(String),
  #[error("Planilha vazia ou sem abas")]
  EmptyWorkbook,
  #[error("Erro ao ler a planilha: {0}")]
  Read(String),
  #[error("Coluna desconhecida: {0}")]
  UnknownColumn(String),
  #[error("Erro ao gerar a planilha: {0}")]
  Write(String),
}

impl From<calamine::Error> for SheetError {
  fn from(e: calamine::Error) -> Self {
    SheetError::Read(e.to_string())
  }
}
