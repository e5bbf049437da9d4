//! Backups do banco SQLite.
//!
//! `create` usa `VACUUM INTO`, que gera uma cópia consistente mesmo com o
//! pool aberto. `restore` apenas copia o arquivo de volta e deve ser feito
//! com o servidor parado.
use chrono::{Local, NaiveDateTime};
use diesel::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const BACKUP_PREFIX: &str = "cedentes_backup_";
pub const DEFAULT_KEEP: usize = 7;
pub const DEFAULT_KEEP_DAYS: i64 = 7;
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const MAX_REASON_LEN: usize = 40;

#[derive(Debug, Error)]
pub enum BackupError {
  #[error("Backup disponível apenas para bancos SQLite em arquivo")]
  Unsupported,
  #[error("Nome de backup inválido: {0}")]
  InvalidName(String),
  #[error("Backup não encontrado: {0}")]
  NotFound(String),
  #[error("Erro de banco: {0}")]
  Database(String),
  #[error("Erro de E/S: {0}")]
  Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupInfo {
  pub filename: String,
  pub size_bytes: u64,
  pub created_at: NaiveDateTime,
  pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupStats {
  pub total_backups: usize,
  pub total_size_bytes: u64,
  pub newest: Option<BackupInfo>,
  pub oldest: Option<BackupInfo>,
  pub directory: String,
}

/// Caminho do arquivo SQLite a partir da URL; `None` para bancos em
/// memória ou Postgres.
pub fn sqlite_file_path(database_url: &str) -> Option<PathBuf> {
  let lower = database_url.to_lowercase();
  if lower.starts_with("postgres") || lower.contains("mode=memory") || lower.contains(":memory:") {
    return None;
  }
  let path = database_url.strip_prefix("sqlite://")
                         .or_else(|| database_url.strip_prefix("sqlite:"))
                         .or_else(|| database_url.strip_prefix("file:"))
                         .unwrap_or(database_url);
  let path = path.split('?').next().unwrap_or(path);
  if path.is_empty() {
    None
  } else {
    Some(PathBuf::from(path))
  }
}

#[derive(Debug, Clone)]
pub struct BackupManager {
  db_path: PathBuf,
  dir: PathBuf,
  keep: usize,
  keep_days: i64,
}

impl BackupManager {
  pub fn new(db_path: impl Into<PathBuf>, dir: impl Into<PathBuf>) -> Self {
    Self { db_path: db_path.into(), dir: dir.into(), keep: DEFAULT_KEEP, keep_days: DEFAULT_KEEP_DAYS }
  }

  /// Monta o gerenciador a partir da URL do banco; falha para Postgres.
  pub fn from_database_url(database_url: &str, dir: impl Into<PathBuf>) -> Result<Self, BackupError> {
    let path = sqlite_file_path(database_url).ok_or(BackupError::Unsupported)?;
    Ok(Self::new(path, dir))
  }

  pub fn with_keep(mut self, keep: usize) -> Self {
    self.keep = keep;
    self
  }

  pub fn with_keep_days(mut self, days: i64) -> Self {
    self.keep_days = days;
    self
  }

  pub fn directory(&self) -> &Path {
    &self.dir
  }

  /// Cria um backup e remove os antigos conforme a retenção.
  pub fn create(&self, reason: &str) -> Result<BackupInfo, BackupError> {
    let info = self.snapshot(reason)?;
    let removed = self.prune()?;
    if removed > 0 {
      log::info!("{} backup(s) antigo(s) removido(s)", removed);
    }
    Ok(info)
  }

  fn snapshot(&self, reason: &str) -> Result<BackupInfo, BackupError> {
    if !self.db_path.exists() {
      return Err(BackupError::NotFound(self.db_path.display().to_string()));
    }
    fs::create_dir_all(&self.dir)?;
    let now = Local::now().naive_local();
    let reason = sanitize_reason(reason);
    let stamp = now.format(TIMESTAMP_FORMAT).to_string();
    let mut filename = format!("{}{}_{}.db", BACKUP_PREFIX, stamp, reason);
    let mut n = 2;
    while self.dir.join(&filename).exists() {
      filename = format!("{}{}_{}-{}.db", BACKUP_PREFIX, stamp, reason, n);
      n += 1;
    }
    let target = self.dir.join(&filename);
    let mut conn = SqliteConnection::establish(&self.db_path.to_string_lossy())
      .map_err(|e| BackupError::Database(e.to_string()))?;
    let escaped = target.to_string_lossy().replace('\'', "''");
    diesel::sql_query(format!("VACUUM INTO '{}'", escaped)).execute(&mut conn)
                                                         .map_err(|e| BackupError::Database(e.to_string()))?;
    let size_bytes = fs::metadata(&target)?.len();
    log::info!("backup criado: {} ({} bytes)", filename, size_bytes);
    let reason = parse_name(&filename).map(|(_, r)| r).unwrap_or(reason);
    Ok(BackupInfo { filename, size_bytes, created_at: now, reason })
  }

  /// Backups do diretório, mais recentes primeiro.
  pub fn list(&self) -> Result<Vec<BackupInfo>, BackupError> {
    if !self.dir.exists() {
      return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for entry in fs::read_dir(&self.dir)? {
      let entry = entry?;
      let name = entry.file_name().to_string_lossy().to_string();
      if let Some((created_at, reason)) = parse_name(&name) {
        out.push(BackupInfo { filename: name, size_bytes: entry.metadata()?.len(), created_at, reason });
      }
    }
    out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.filename.cmp(&a.filename)));
    Ok(out)
  }

  pub fn stats(&self) -> Result<BackupStats, BackupError> {
    let list = self.list()?;
    Ok(BackupStats { total_backups: list.len(),
                     total_size_bytes: list.iter().map(|b| b.size_bytes).sum(),
                     newest: list.first().cloned(),
                     oldest: list.last().cloned(),
                     directory: self.dir.display().to_string() })
  }

  /// Remove backups além dos `keep` mais recentes que também sejam mais
  /// velhos que `keep_days`.
  pub fn prune(&self) -> Result<usize, BackupError> {
    let cutoff = Local::now().naive_local() - chrono::Duration::days(self.keep_days);
    let mut removed = 0;
    for old in self.list()?.into_iter().skip(self.keep) {
      if old.created_at < cutoff {
        fs::remove_file(self.dir.join(&old.filename))?;
        removed += 1;
      }
    }
    Ok(removed)
  }

  /// Substitui o banco pelo backup indicado. Antes, guarda uma cópia do
  /// banco atual com o motivo `pre_restauracao`.
  pub fn restore(&self, filename: &str) -> Result<Option<BackupInfo>, BackupError> {
    validate_name(filename)?;
    let source = self.dir.join(filename);
    if !source.is_file() {
      return Err(BackupError::NotFound(filename.to_string()));
    }
    let snapshot = if self.db_path.exists() { Some(self.snapshot("pre_restauracao")?) } else { None };
    fs::copy(&source, &self.db_path)?;
    for suffix in ["-wal", "-shm"] {
      let side = PathBuf::from(format!("{}{}", self.db_path.display(), suffix));
      if side.exists() {
        fs::remove_file(side)?;
      }
    }
    log::warn!("banco restaurado a partir de {}", filename);
    Ok(snapshot)
  }
}

fn sanitize_reason(reason: &str) -> String {
  let cleaned: String = reason.trim()
                              .chars()
                              .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c.to_ascii_lowercase() } else { '_' })
                              .take(MAX_REASON_LEN)
                              .collect();
  let cleaned = cleaned.trim_matches('_').to_string();
  if cleaned.is_empty() {
    "manual".to_string()
  } else {
    cleaned
  }
}

fn validate_name(filename: &str) -> Result<(), BackupError> {
  if filename.contains('/') || filename.contains('\\') || filename.contains("..") || parse_name(filename).is_none() {
    return Err(BackupError::InvalidName(filename.to_string()));
  }
  Ok(())
}

/// `cedentes_backup_20250101_020000_automatico.db` → (data, "automatico").
fn parse_name(filename: &str) -> Option<(NaiveDateTime, String)> {
  let rest = filename.strip_prefix(BACKUP_PREFIX)?.strip_suffix(".db")?;
  let stamp = rest.get(..15)?;
  let created_at = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;
  let reason = rest.get(15..)?.strip_prefix('_').unwrap_or("").to_string();
  Some((created_at, reason))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_backup_names() {
    let (at, reason) = parse_name("cedentes_backup_20250102_030405_automatico.db").unwrap();
    assert_eq!(at.format("%Y-%m-%d %H:%M:%S").to_string(), "2025-01-02 03:04:05");
    assert_eq!(reason, "automatico");
    assert!(parse_name("outro_arquivo.db").is_none());
    assert!(parse_name("cedentes_backup_2025_x.db").is_none());
  }

  #[test]
  fn rejects_path_traversal() {
    assert!(matches!(validate_name("../cedentes_backup_20250102_030405_x.db"), Err(BackupError::InvalidName(_))));
    assert!(matches!(validate_name("a/cedentes_backup_20250102_030405_x.db"), Err(BackupError::InvalidName(_))));
    assert!(validate_name("cedentes_backup_20250102_030405_x.db").is_ok());
  }

  #[test]
  fn reasons_are_sanitized() {
    assert_eq!(sanitize_reason("Antes da importação!"), "antes_da_importa__o");
    assert_eq!(sanitize_reason("   "), "manual");
  }

  #[test]
  fn sqlite_paths_from_urls() {
    assert_eq!(sqlite_file_path("instance/cedentes.db"), Some(PathBuf::from("instance/cedentes.db")));
    assert_eq!(sqlite_file_path("sqlite:///tmp/x.db"), Some(PathBuf::from("/tmp/x.db")));
    assert_eq!(sqlite_file_path("file:data.db?mode=rwc"), Some(PathBuf::from("data.db")));
    assert_eq!(sqlite_file_path("postgres://u@h/db"), None);
    assert_eq!(sqlite_file_path("file:mem?mode=memory&cache=shared"), None);
  }
}
