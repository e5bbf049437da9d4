//! Helpers de normalização de texto usados para comparar rótulos vindos de
//! planilhas e formulários (maiúsculas, acentos e pontuação variam muito).
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Minúsculas, sem acentos, e qualquer sequência de caracteres não
/// alfanuméricos reduzida a um único espaço.
///
/// `"NOME / RAZÃO SOCIAL"` → `"nome razao social"`.
pub fn fold(input: &str) -> String {
  let mut out = String::with_capacity(input.len());
  let mut pending_space = false;
  for c in input.nfd().filter(|c| !is_combining_mark(*c)) {
    if c.is_alphanumeric() {
      if pending_space && !out.is_empty() {
        out.push(' ');
      }
      pending_space = false;
      out.extend(c.to_lowercase());
    } else {
      pending_space = true;
    }
  }
  out
}

/// Remove espaços nas pontas e colapsa espaços internos.
pub fn collapse_whitespace(input: &str) -> String {
  input.split_whitespace().collect::<Vec<_>>().join(" ")
}
