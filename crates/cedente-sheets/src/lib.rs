//! Planilhas do cadastro: leitura de uploads (CSV, XLSX, XLS, ODS) com
//! detecção de cabeçalho e normalização de células, e exportação em CSV.

pub mod columns;
mod errors;
pub mod export;
pub mod normalize;
pub mod reader;

pub use columns::{detect_layout, ColumnMap, Field, Layout};
pub use errors::SheetError;
pub use export::{export_csv, export_filename, parse_columns, ExportColumn};
pub use normalize::rows_to_import;
pub use reader::{read_rows, Cell, SheetFormat};

use cedente_domain::ImportRow;

/// Lê o arquivo enviado e devolve as linhas prontas para `apply_rows`.
pub fn parse_upload(filename: &str, bytes: &[u8]) -> Result<Vec<ImportRow>, SheetError> {
  let format = SheetFormat::from_filename(filename)?;
  let rows = read_rows(format, bytes)?;
  let out = rows_to_import(&rows);
  log::info!("planilha {}: {} linhas lidas, {} com dados", filename, rows.len(), out.len());
  Ok(out)
}
