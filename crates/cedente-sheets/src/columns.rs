use crate::reader::Cell;
use cedente_domain::text::fold;

/// Linhas inspecionadas em busca do cabeçalho.
pub const HEADER_SCAN_ROWS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
  Nome,
  Documento,
  Status,
  Validade,
  Observacoes,
}

const ALIASES: &[(Field, &[&str])] =
  &[(Field::Nome, &["nome / razao social", "nome razao social", "razao social", "nome", "cedente"]),
    (Field::Documento, &["cpf / cnpj", "cpf cnpj", "cpf", "cnpj", "documento"]),
    (Field::Status, &["contrato", "status", "situacao", "status contrato"]),
    (Field::Validade, &["validade contrato", "validade", "data validade", "vencimento", "data vencimento"]),
    (Field::Observacoes, &["observacoes", "obs"])];

/// Campo correspondente a um título de coluna, ignorando acentos,
/// maiúsculas, pontuação e preposições ("Data de Vencimento").
pub fn field_for_header(raw: &str) -> Option<Field> {
  let key = header_key(raw);
  if key.is_empty() {
    return None;
  }
  ALIASES.iter()
         .find(|(_, aliases)| aliases.iter().any(|a| header_key(a) == key))
         .map(|(field, _)| *field)
}

fn header_key(raw: &str) -> String {
  fold(raw).split(' ')
           .filter(|w| !matches!(*w, "de" | "da" | "do" | "das" | "dos"))
           .collect::<Vec<_>>()
           .join(" ")
}

/// Índices (base 0) das colunas usadas na importação.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
  pub nome: usize,
  pub documento: usize,
  pub status: Option<usize>,
  pub validade: Option<usize>,
  pub observacoes: Option<usize>,
}

impl ColumnMap {
  /// Layout antigo sem cabeçalho: B nome, C documento, D contrato, E validade.
  pub const POSITIONAL: ColumnMap =
    ColumnMap { nome: 1, documento: 2, status: Some(3), validade: Some(4), observacoes: None };

  fn from_header(row: &[Cell]) -> Option<ColumnMap> {
    let mut found: [Option<usize>; 5] = [None; 5];
    for (idx, cell) in row.iter().enumerate() {
      let Some(text) = cell.as_text() else { continue };
      if let Some(field) = field_for_header(&text) {
        let slot = &mut found[field as usize];
        if slot.is_none() {
          *slot = Some(idx);
        }
      }
    }
    Some(ColumnMap { nome: found[Field::Nome as usize]?,
                     documento: found[Field::Documento as usize]?,
                     status: found[Field::Status as usize],
                     validade: found[Field::Validade as usize],
                     observacoes: found[Field::Observacoes as usize] })
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
  pub columns: ColumnMap,
  /// Índice da primeira linha de dados.
  pub first_data_row: usize,
  pub has_header: bool,
}

/// Procura o cabeçalho nas primeiras linhas; sem ele, assume o layout
/// posicional a partir da primeira linha cujo documento tenha dígitos.
pub fn detect_layout(rows: &[Vec<Cell>]) -> Layout {
  for (idx, row) in rows.iter().take(HEADER_SCAN_ROWS).enumerate() {
    if let Some(columns) = ColumnMap::from_header(row) {
      return Layout { columns, first_data_row: idx + 1, has_header: true };
    }
  }
  let doc_col = ColumnMap::POSITIONAL.documento;
  let first_data_row = rows.iter()
                           .position(|row| {
                             row.get(doc_col)
                                .and_then(Cell::as_text)
                                .is_some_and(|t| t.chars().any(|c| c.is_ascii_digit()))
                           })
                           .unwrap_or(rows.len());
  Layout { columns: ColumnMap::POSITIONAL, first_data_row, has_header: false }
}
