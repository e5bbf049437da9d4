//! Interpretação das datas digitadas por usuários ou vindas de planilhas.
use chrono::NaiveDate;

/// Aceita `AAAA-MM-DD`, `DD/MM/AAAA`, `DD-MM-AAAA`, `DD.MM.AAAA`,
/// `AAAA/MM/DD` e `DD/MM/AA` (anos de dois dígitos caem em 20AA), com ou
/// sem hora depois da data. Texto vazio ou fora desses formatos devolve
/// `None`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
  let s = raw.trim();
  let date_part = s.split([' ', 'T']).next()?;
  let parts: Vec<&str> = date_part.split(['/', '-', '.']).collect();
  if parts.len() != 3 || parts.iter().any(|p| p.is_empty() || !p.chars().all(|c| c.is_ascii_digit())) {
    return None;
  }
  let num = |p: &str| p.parse::<u32>().ok();
  let (year, month, day) = match (parts[0].len(), parts[2].len()) {
    (4, 1..=2) => (num(parts[0])? as i32, num(parts[1])?, num(parts[2])?),
    (1..=2, 4) => (num(parts[2])? as i32, num(parts[1])?, num(parts[0])?),
    (1..=2, 2) => (2000 + num(parts[2])? as i32, num(parts[1])?, num(parts[0])?),
    _ => return None,
  };
  if parts[1].len() > 2 {
    return None;
  }
  NaiveDate::from_ymd_opt(year, month, day)
}

/// Formato de exibição usado em mensagens e exportações.
pub fn format_br(date: NaiveDate) -> String {
  date.format("%d/%m/%Y").to_string()
}
