//! Configuração do servidor lida do ambiente (e do `.env`, se existir).
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Maior `MAX_UPLOAD_MB` aceito.
pub const MAX_UPLOAD_MB_LIMIT: usize = 1024;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
  #[error("valor inválido para {key}: '{value}'")]
  Invalid { key: &'static str, value: String },
  #[error("template inválido: {0}")]
  Template(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
  pub host: String,
  pub port: u16,
  pub backup_dir: PathBuf,
  pub backup_keep: usize,
  pub max_upload_mb: usize,
  pub expiry_window_days: i64,
  pub notification_interval_secs: u64,
  pub enable_background_jobs: bool,
  /// Hora local (0-23) do backup diário.
  pub backup_hour: u32,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self { host: "0.0.0.0".to_string(),
           port: 5000,
           backup_dir: PathBuf::from("backups"),
           backup_keep: 7,
           max_upload_mb: 10,
           expiry_window_days: cedente_domain::DEFAULT_EXPIRY_WINDOW_DAYS,
           notification_interval_secs: 3600,
           enable_background_jobs: true,
           backup_hour: 2 }
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self, ConfigError> {
    dotenvy::dotenv().ok();
    Self::from_lookup(|key| std::env::var(key).ok())
  }

  /// Igual a `from_env`, mas lendo as variáveis de `get`.
  pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
    let d = Self::default();
    let cfg = Self { host: get("HOST").filter(|h| !h.trim().is_empty()).unwrap_or(d.host),
                     port: parse_var(&get, "PORT", d.port)?,
                     backup_dir: get("BACKUP_DIR").filter(|p| !p.trim().is_empty()).map(PathBuf::from).unwrap_or(d.backup_dir),
                     backup_keep: parse_var(&get, "BACKUP_KEEP", d.backup_keep)?,
                     max_upload_mb: parse_var(&get, "MAX_UPLOAD_MB", d.max_upload_mb)?,
                     expiry_window_days: parse_var(&get, "EXPIRY_WINDOW_DAYS", d.expiry_window_days)?,
                     notification_interval_secs: parse_var(&get, "NOTIFICATION_INTERVAL_SECS", d.notification_interval_secs)?,
                     enable_background_jobs: parse_bool(&get, "ENABLE_BACKGROUND_JOBS", d.enable_background_jobs)?,
                     backup_hour: parse_var(&get, "BACKUP_HOUR", d.backup_hour)? };
    if cfg.backup_hour > 23 {
      return Err(ConfigError::Invalid { key: "BACKUP_HOUR", value: cfg.backup_hour.to_string() });
    }
    if cfg.max_upload_mb == 0 || cfg.max_upload_mb > MAX_UPLOAD_MB_LIMIT {
      return Err(ConfigError::Invalid { key: "MAX_UPLOAD_MB", value: cfg.max_upload_mb.to_string() });
    }
    if cfg.notification_interval_secs == 0 {
      return Err(ConfigError::Invalid { key: "NOTIFICATION_INTERVAL_SECS", value: "0".into() });
    }
    if cfg.expiry_window_days < 0 {
      return Err(ConfigError::Invalid { key: "EXPIRY_WINDOW_DAYS", value: cfg.expiry_window_days.to_string() });
    }
    Ok(cfg)
  }

  pub fn bind_addr(&self) -> String {
    format!("{}:{}", self.host, self.port)
  }

  pub fn max_upload_bytes(&self) -> usize {
    self.max_upload_mb * 1024 * 1024
  }
}

fn parse_var<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> Result<T, ConfigError> {
  match get(key) {
    None => Ok(default),
    Some(v) if v.trim().is_empty() => Ok(default),
    Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid { key, value: v }),
  }
}

fn parse_bool(get: &impl Fn(&str) -> Option<String>, key: &'static str, default: bool) -> Result<bool, ConfigError> {
  match get(key).map(|v| v.trim().to_lowercase()) {
    None => Ok(default),
    Some(v) => match v.as_str() {
      "" => Ok(default),
      "1" | "true" | "yes" | "on" | "sim" => Ok(true),
      "0" | "false" | "no" | "off" | "nao" | "não" => Ok(false),
      _ => Err(ConfigError::Invalid { key, value: v }),
    },
  }
}
