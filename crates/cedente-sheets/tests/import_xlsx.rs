use cedente_domain::import::apply_rows;
use cedente_domain::{CedenteFilter, CedenteRepository, ContractStatus, InMemoryCedenteRepository};
use cedente_sheets::{parse_upload, read_rows, Cell, SheetFormat};
use chrono::NaiveDate;

// Linha 1 vazia, título em B2, cabeçalho em B3:E3, dados a partir da linha 4.
// CPF/CNPJ gravados como número e validade com formato de data.
const LEGACY_XLSX: &[u8] = include_bytes!("fixtures/cedentes_legado.xlsx");

#[test]
fn workbook_cells_keep_sheet_positions() {
  let rows = read_rows(SheetFormat::Xlsx, LEGACY_XLSX).expect("read workbook");
  assert_eq!(rows.len(), 6);
  assert!(rows[0].iter().all(Cell::is_blank));
  assert_eq!(rows[1][0], Cell::Empty);
  assert_eq!(rows[1][1], Cell::Text("CADASTRO DE CEDENTES - GOLD CREDIT SA".into()));
  assert_eq!(rows[2][1], Cell::Text("NOME / RAZÃO SOCIAL".into()));
  assert_eq!(rows[3][2], Cell::Number(52998224725.0));
  assert_eq!(rows[3][4], Cell::Date(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()));
  assert_eq!(rows[4][4], Cell::Date(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()));
}

#[test]
fn workbook_rows_are_normalized() {
  let rows = parse_upload("Cedentes.xlsx", LEGACY_XLSX).expect("parse");
  assert_eq!(rows.len(), 3);

  assert_eq!(rows[0].row_number, 4);
  assert_eq!(rows[0].nome.as_deref(), Some("Maria Silva"));
  assert_eq!(rows[0].cpf_cnpj.as_deref(), Some("52998224725"));
  assert_eq!(rows[0].status, Some(ContractStatus::AssinadoManual));
  assert_eq!(rows[0].validade_contrato, NaiveDate::from_ymd_opt(2025, 1, 1));
  assert!(rows[0].warnings.is_empty());

  // CNPJ e CPF numéricos perdem o zero inicial na planilha
  assert_eq!(rows[1].cpf_cnpj.as_deref(), Some("04252011000110"));
  assert_eq!(rows[1].status, Some(ContractStatus::PontosAtencao));
  assert_eq!(rows[1].validade_contrato, NaiveDate::from_ymd_opt(2025, 12, 31));

  assert_eq!(rows[2].row_number, 6);
  assert_eq!(rows[2].cpf_cnpj.as_deref(), Some("01234567890"));
  assert_eq!(rows[2].status, None);
  assert_eq!(rows[2].validade_contrato, None);
}

#[test]
fn workbook_imports_end_to_end() {
  let repo = InMemoryCedenteRepository::new();
  let report = apply_rows(&repo, parse_upload("cedentes.xlsx", LEGACY_XLSX).expect("parse"));
  assert_eq!(report.created, 3);
  assert!(report.errors.is_empty());
  assert!(report.skipped.is_empty());

  let all = repo.list(&CedenteFilter::default()).unwrap();
  let names: Vec<&str> = all.iter().map(|c| c.nome_razao_social.as_str()).collect();
  assert_eq!(names, vec!["José Pereira", "Maria Silva", "Padaria São João Ltda"]);
  assert_eq!(all[0].status, ContractStatus::SemAssinatura);
}
