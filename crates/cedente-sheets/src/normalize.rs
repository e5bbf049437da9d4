//! Normalização das células de cada linha para `ImportRow`.
use crate::columns::{detect_layout, ColumnMap};
use crate::reader::{serial_to_date, Cell};
use cedente_domain::dates::parse_date;
use cedente_domain::text::collapse_whitespace;
use cedente_domain::{ContractStatus, ImportRow};
use chrono::NaiveDate;

/// Dígitos do documento com zeros à esquerda repostos (planilhas costumam
/// gravar CPF/CNPJ como número e perder o zero inicial).
pub fn normalize_documento(cell: &Cell) -> Option<String> {
  let text = cell.as_text()?;
  let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
  let width = match digits.len() {
    0 => return None,
    1..=11 => 11,
    12..=13 => 14,
    _ => digits.len(),
  };
  Some(format!("{:0>width$}", digits, width = width))
}

/// `Ok(None)` para célula vazia, `Err` com o texto recebido quando não é
/// uma data reconhecível.
pub fn normalize_date(cell: &Cell) -> Result<Option<NaiveDate>, String> {
  match cell {
    Cell::Empty => Ok(None),
    Cell::Date(d) => Ok(Some(*d)),
    Cell::Number(n) => serial_to_date(*n).map(Some).ok_or_else(|| n.to_string()),
    Cell::Bool(b) => Err(b.to_string()),
    Cell::Text(raw) => {
      let t = raw.trim();
      if t.is_empty() {
        return Ok(None);
      }
      if t.len() <= 6 && t.chars().all(|c| c.is_ascii_digit()) {
        if let Some(d) = t.parse::<f64>().ok().and_then(serial_to_date) {
          return Ok(Some(d));
        }
      }
      parse_date(t).map(Some).ok_or_else(|| t.to_string())
    }
  }
}

pub fn normalize_status(cell: &Cell) -> Result<Option<ContractStatus>, String> {
  match cell.as_text() {
    None => Ok(None),
    Some(t) => ContractStatus::parse(&t).map(Some).ok_or(t),
  }
}

fn text_at(row: &[Cell], idx: usize) -> Option<String> {
  row.get(idx).and_then(Cell::as_text).map(|t| collapse_whitespace(&t)).filter(|t| !t.is_empty())
}

fn row_to_import(row_number: usize, row: &[Cell], cols: &ColumnMap) -> ImportRow {
  let empty = Cell::Empty;
  let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i)).unwrap_or(&empty);
  let mut out = ImportRow { row_number,
                            nome: text_at(row, cols.nome),
                            cpf_cnpj: normalize_documento(cell(Some(cols.documento))),
                            observacoes: cols.observacoes.and_then(|i| row.get(i)).and_then(Cell::as_text),
                            ..Default::default() };
  match normalize_status(cell(cols.status)) {
    Ok(s) => out.status = s,
    Err(raw) => out.warnings.push(format!("Status não reconhecido: {}", raw)),
  }
  match normalize_date(cell(cols.validade)) {
    Ok(d) => out.validade_contrato = d,
    Err(raw) => out.warnings.push(format!("Data de validade não reconhecida: {}", raw)),
  }
  out
}

/// Converte as linhas cruas da planilha em linhas de importação. Linhas
/// em branco são descartadas sem contar.
pub fn rows_to_import(rows: &[Vec<Cell>]) -> Vec<ImportRow> {
  let layout = detect_layout(rows);
  log::debug!("importação: cabeçalho={} primeira linha de dados={} colunas={:?}",
              layout.has_header,
              layout.first_data_row + 1,
              layout.columns);
  rows.iter()
      .enumerate()
      .skip(layout.first_data_row)
      .filter(|(_, row)| !row.iter().all(Cell::is_blank))
      .map(|(idx, row)| row_to_import(idx + 1, row, &layout.columns))
      .collect()
}
