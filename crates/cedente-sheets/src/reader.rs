//! Leitura crua das planilhas enviadas: CSV pelo crate `csv`, demais
//! formatos pelo `calamine`. Só a primeira aba é lida.
use crate::SheetError;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use cedente_domain::dates::format_br;
use chrono::{Duration, NaiveDate};
use std::borrow::Cow;
use std::io::Cursor;

/// Maior serial de data aceito pelo Excel (31/12/9999).
const MAX_EXCEL_SERIAL: f64 = 2_958_465.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
  Csv,
  Xlsx,
  Xls,
  Ods,
}

impl SheetFormat {
  pub fn from_filename(filename: &str) -> Result<Self, SheetError> {
    let ext = filename.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase()).unwrap_or_default();
    match ext.as_str() {
      "csv" => Ok(SheetFormat::Csv),
      "xlsx" | "xlsm" => Ok(SheetFormat::Xlsx),
      "xls" => Ok(SheetFormat::Xls),
      "ods" => Ok(SheetFormat::Ods),
      _ => Err(SheetError::UnsupportedFormat(filename.to_string())),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
  Empty,
  Text(String),
  Number(f64),
  Bool(bool),
  Date(NaiveDate),
}

impl Cell {
  pub fn is_blank(&self) -> bool {
    match self {
      Cell::Empty => true,
      Cell::Text(s) => s.trim().is_empty(),
      _ => false,
    }
  }

  /// Texto da célula sem espaços nas pontas; `None` quando vazia.
  pub fn as_text(&self) -> Option<String> {
    let s = match self {
      Cell::Empty => return None,
      Cell::Text(s) => s.trim().to_string(),
      Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{:.0}", n),
      Cell::Number(n) => n.to_string(),
      Cell::Bool(b) => b.to_string(),
      Cell::Date(d) => format_br(*d),
    };
    if s.is_empty() {
      None
    } else {
      Some(s)
    }
  }
}

/// Converte um serial de data do Excel (base 30/12/1899).
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
  if !(1.0..=MAX_EXCEL_SERIAL).contains(&serial) {
    return None;
  }
  let base = NaiveDate::from_ymd_opt(1899, 12, 30)?;
  base.checked_add_signed(Duration::days(serial.floor() as i64))
}

pub fn read_rows(format: SheetFormat, bytes: &[u8]) -> Result<Vec<Vec<Cell>>, SheetError> {
  match format {
    SheetFormat::Csv => read_csv(bytes),
    SheetFormat::Xlsx | SheetFormat::Xls | SheetFormat::Ods => read_workbook(bytes),
  }
}

fn read_workbook(bytes: &[u8]) -> Result<Vec<Vec<Cell>>, SheetError> {
  let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
  let range = workbook.worksheet_range_at(0).ok_or(SheetError::EmptyWorkbook)??;
  // o range começa na primeira célula usada, não em A1
  let (row0, col0) = range.start().unwrap_or((0, 0));
  let mut rows: Vec<Vec<Cell>> = (0..row0).map(|_| Vec::new()).collect();
  for r in range.rows() {
    let mut row: Vec<Cell> = (0..col0).map(|_| Cell::Empty).collect();
    row.extend(r.iter().map(cell_from_data));
    rows.push(row);
  }
  Ok(rows)
}

fn cell_from_data(d: &Data) -> Cell {
  match d {
    Data::Empty | Data::Error(_) => Cell::Empty,
    Data::String(s) => Cell::Text(s.clone()),
    Data::Int(i) => Cell::Number(*i as f64),
    Data::Float(f) => Cell::Number(*f),
    Data::Bool(b) => Cell::Bool(*b),
    Data::DateTime(dt) => serial_to_date(dt.as_f64()).map(Cell::Date).unwrap_or(Cell::Number(dt.as_f64())),
    Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
  }
}

fn read_csv(bytes: &[u8]) -> Result<Vec<Vec<Cell>>, SheetError> {
  let text = decode_text(bytes);
  let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
  let mut reader = csv::ReaderBuilder::new().delimiter(sniff_delimiter(text))
                                            .has_headers(false)
                                            .flexible(true)
                                            .from_reader(text.as_bytes());
  let mut rows = Vec::new();
  for record in reader.records() {
    let record = record.map_err(|e| SheetError::Read(e.to_string()))?;
    rows.push(record.iter()
                    .map(|f| if f.trim().is_empty() { Cell::Empty } else { Cell::Text(f.to_string()) })
                    .collect());
  }
  Ok(rows)
}

/// UTF-8 quando válido; senão Latin-1, comum em CSV salvo pelo Excel.
fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
  match std::str::from_utf8(bytes) {
    Ok(s) => Cow::Borrowed(s),
    Err(_) => Cow::Owned(bytes.iter().map(|&b| b as char).collect()),
  }
}

fn sniff_delimiter(text: &str) -> u8 {
  let first = text.lines().next().unwrap_or("");
  let semicolons = first.matches(';').count();
  let commas = first.matches(',').count();
  if semicolons > 0 && semicolons >= commas {
    b';'
  } else {
    b','
  }
}
