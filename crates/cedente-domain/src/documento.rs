// documento.rs
use crate::DomainError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentoKind {
  Cpf,
  Cnpj,
}

/// CPF ou CNPJ já validado, guardado apenas com dígitos.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Documento {
  digits: String,
}

impl Documento {
  /// Aceita o número com ou sem máscara (`529.982.247-25`, `52998224725`).
  pub fn parse(raw: &str) -> Result<Self, DomainError> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
      return Err(DomainError::ValidationError("CPF/CNPJ é obrigatório".to_string()));
    }
    let valid = match digits.len() {
      11 => cpf_is_valid(&digits),
      14 => cnpj_is_valid(&digits),
      n => {
        return Err(DomainError::ValidationError(format!("CPF deve ter 11 dígitos ou CNPJ 14 dígitos (recebido {})", n)))
      }
    };
    if !valid {
      return Err(DomainError::ValidationError(format!("CPF/CNPJ inválido: {}", raw.trim())));
    }
    Ok(Self { digits })
  }

  /// Reconstrói um documento lido do banco sem revalidar dígitos
  /// verificadores (registros legados podem não passar na validação).
  pub fn from_stored(digits: &str) -> Self {
    Self { digits: digits.chars().filter(|c| c.is_ascii_digit()).collect() }
  }

  pub fn digits(&self) -> &str {
    &self.digits
  }

  pub fn kind(&self) -> DocumentoKind {
    if self.digits.len() == 14 {
      DocumentoKind::Cnpj
    } else {
      DocumentoKind::Cpf
    }
  }

  /// `000.000.000-00` para CPF, `00.000.000/0000-00` para CNPJ.
  pub fn formatted(&self) -> String {
    let d = &self.digits;
    match (self.kind(), d.len()) {
      (DocumentoKind::Cpf, 11) => format!("{}.{}.{}-{}", &d[0..3], &d[3..6], &d[6..9], &d[9..11]),
      (DocumentoKind::Cnpj, 14) => format!("{}.{}.{}/{}-{}", &d[0..2], &d[2..5], &d[5..8], &d[8..12], &d[12..14]),
      _ => d.clone(),
    }
  }
}

fn to_numbers(digits: &str) -> Vec<u32> {
  digits.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn all_same(n: &[u32]) -> bool {
  n.windows(2).all(|w| w[0] == w[1])
}

fn cpf_is_valid(digits: &str) -> bool {
  let n = to_numbers(digits);
  if n.len() != 11 || all_same(&n) {
    return false;
  }
  let check = |len: usize| -> u32 {
    let sum: u32 = n[..len].iter().enumerate().map(|(i, d)| d * (len as u32 + 1 - i as u32)).sum();
    (sum * 10 % 11) % 10
  };
  check(9) == n[9] && check(10) == n[10]
}

fn cnpj_is_valid(digits: &str) -> bool {
  const W1: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
  const W2: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
  let n = to_numbers(digits);
  if n.len() != 14 || all_same(&n) {
    return false;
  }
  let check = |weights: &[u32]| -> u32 {
    let sum: u32 = weights.iter().zip(n.iter()).map(|(w, d)| w * d).sum();
    let r = 11 - sum % 11;
    if r > 9 {
      0
    } else {
      r
    }
  };
  check(&W1) == n[12] && check(&W2) == n[13]
}

impl fmt::Display for Documento {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.formatted())
  }
}

impl Serialize for Documento {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&self.digits)
  }
}

impl<'de> Deserialize<'de> for Documento {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Documento::parse(&raw).map_err(serde::de::Error::custom)
  }
}
