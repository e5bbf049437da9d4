use anyhow::{bail, Context, Result};
use cedente_domain::{CedenteFilter, CedenteService, ContractStatus, ImportReport};
use cedente_persistence::{backend_name, database_url_from_env, new_from_env, BackupManager};
use cedente_sheets::{export_csv, parse_columns, parse_upload};
use cedente_web::{AppConfig, AppState};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Cadastro de cedentes da Gold Credit SA.
#[derive(Parser, Debug)]
#[command(name = "goldcredit", version, about = "Cadastro de cedentes da Gold Credit SA")]
struct Cli {
  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
enum Command {
  /// Sobe o servidor HTTP (padrão)
  Serve,
  /// Importa uma planilha (.csv, .xlsx, .xls, .ods)
  Import {
    #[arg(value_name = "ARQUIVO")]
    file: PathBuf,
  },
  /// Exporta os cedentes para CSV
  Export {
    #[arg(value_name = "ARQUIVO")]
    file: PathBuf,
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    status: Option<String>,
    /// Colunas separadas por vírgula (ex.: nome,cpf_cnpj,validade)
    #[arg(long)]
    colunas: Option<String>,
  },
  /// Cria um backup do banco SQLite
  Backup {
    #[arg(long, default_value = "manual")]
    reason: String,
    /// Apenas lista os backups existentes
    #[arg(long)]
    list: bool,
  },
  /// Restaura um backup; rode com o servidor parado
  Restore {
    #[arg(value_name = "BACKUP")]
    filename: String,
  },
  /// Gera as notificações de vencimento e documentos pendentes
  CheckNotifications,
}

#[tokio::main]
async fn main() -> Result<()> {
  dotenvy::dotenv().ok();
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

  let cli = Cli::parse();
  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve().await,
    Command::Import { file } => import(&file),
    Command::Export { file, search, status, colunas } => export(&file, search, status, colunas.as_deref()),
    Command::Backup { reason, list } => backup(&reason, list),
    Command::Restore { filename } => restore(&filename),
    Command::CheckNotifications => check_notifications(),
  }
}

fn service() -> Result<CedenteService> {
  let repo = new_from_env().context("falha ao abrir o banco de dados")?;
  Ok(CedenteService::new(Arc::new(repo)))
}

fn backup_manager(config: &AppConfig) -> Result<BackupManager> {
  let url = database_url_from_env()?;
  Ok(BackupManager::from_database_url(&url, &config.backup_dir)?.with_keep(config.backup_keep))
}

async fn serve() -> Result<()> {
  let config = AppConfig::from_env()?;
  let repo = new_from_env().context("falha ao abrir o banco de dados")?;
  let backups = match backup_manager(&config) {
    Ok(m) => Some(m),
    Err(e) => {
      log::info!("backups desativados: {}", e);
      None
    }
  };
  let mut state = AppState::new(Arc::new(repo), config, backend_name())?;
  if let Some(m) = backups {
    state = state.with_backups(m);
  }
  cedente_web::serve(state).await.context("falha no servidor HTTP")
}

fn import(file: &Path) -> Result<()> {
  let bytes = std::fs::read(file).with_context(|| format!("não foi possível ler {}", file.display()))?;
  let name = file.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
  let rows = parse_upload(&name, &bytes)?;
  let report = service()?.import(rows);
  print_report(&report);
  Ok(())
}

fn print_report(report: &ImportReport) {
  println!("{}", report.message());
  for (titulo, issues) in [("Ignoradas", &report.skipped), ("Erros", &report.errors), ("Avisos", &report.warnings)] {
    if issues.is_empty() {
      continue;
    }
    println!("{}:", titulo);
    for issue in issues {
      println!("  linha {}: {}", issue.linha, issue.mensagem);
    }
  }
}

fn export(file: &Path, search: Option<String>, status: Option<String>, colunas: Option<&str>) -> Result<()> {
  let config = AppConfig::from_env()?;
  let status = match status.as_deref().map(str::trim) {
    None | Some("") => None,
    Some(raw) => Some(raw.parse::<ContractStatus>()?),
  };
  let columns = parse_columns(colunas)?;
  let cedentes = service()?.list(&CedenteFilter { search, status })?;
  let bytes = export_csv(&cedentes, &columns, Local::now().date_naive(), config.expiry_window_days)?;
  std::fs::write(file, bytes).with_context(|| format!("não foi possível gravar {}", file.display()))?;
  println!("{} cedente(s) exportado(s) para {}", cedentes.len(), file.display());
  Ok(())
}

fn backup(reason: &str, list: bool) -> Result<()> {
  let config = AppConfig::from_env()?;
  let manager = backup_manager(&config)?;
  if list {
    let backups = manager.list()?;
    if backups.is_empty() {
      println!("Nenhum backup em {}", manager.directory().display());
    }
    for b in backups {
      println!("{}  {:>10} bytes  {}", b.created_at.format("%d/%m/%Y %H:%M:%S"), b.size_bytes, b.filename);
    }
    return Ok(());
  }
  let info = manager.create(reason)?;
  println!("Backup criado: {} ({} bytes)", info.filename, info.size_bytes);
  Ok(())
}

fn restore(filename: &str) -> Result<()> {
  if filename.trim().is_empty() {
    bail!("informe o nome do backup");
  }
  let config = AppConfig::from_env()?;
  let manager = backup_manager(&config)?;
  if let Some(snapshot) = manager.restore(filename)? {
    println!("Banco atual salvo em {}", snapshot.filename);
  }
  println!("Banco restaurado a partir de {}", filename);
  Ok(())
}

fn check_notifications() -> Result<()> {
  let report = service()?.run_notification_checks(Local::now().naive_local())?;
  println!("{} aviso(s) de vencimento, {} contrato(s) vencido(s), {} cedente(s) com documentos pendentes, {} \
            notificação(ões) antiga(s) removida(s)",
           report.vencimento,
           report.vencidos,
           report.documentos_pendentes,
           report.removidas);
  Ok(())
}
