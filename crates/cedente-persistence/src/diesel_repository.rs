use crate::schema;
use crate::schema::cedentes::dsl as ced_dsl;
use crate::schema::documentos_cedente::dsl as doc_dsl;
use crate::schema::notificacoes::dsl as not_dsl;
use cedente_domain::{Cedente, CedenteFilter, CedenteRepository, ContractStatus, DocumentChecklist, Documento, DomainError,
                     NewCedente, NewNotification, Notification, NotificationKind};
use chrono::{Local, NaiveDate, NaiveDateTime, SubsecRound};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel::sql_types::BigInt;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::collections::HashMap;
use std::sync::Arc;

#[cfg(not(feature = "pg"))]
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations/sqlite");
#[cfg(feature = "pg")]
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations/postgres");
#[cfg(feature = "pg")]
type DbConn = PgConnection;
#[cfg(not(feature = "pg"))]
type DbConn = SqliteConnection;
type DbPool = Pool<ConnectionManager<DbConn>>;

/// Caminho do banco SQLite quando nenhuma URL é configurada.
pub const DEFAULT_SQLITE_PATH: &str = "instance/cedentes.db";

#[cfg(not(feature = "pg"))]
const LAST_ID_SQL: &str = "SELECT last_insert_rowid() AS id";
#[cfg(feature = "pg")]
const LAST_ID_SQL: &str = "SELECT lastval() AS id";

/// Nome do backend compilado, exposto no `/health`.
pub fn backend_name() -> &'static str {
  if cfg!(feature = "pg") {
    "postgresql"
  } else {
    "sqlite"
  }
}

// busy_timeout vale por conexão; journal_mode=WAL fica gravado no arquivo.
#[cfg(not(feature = "pg"))]
#[derive(Debug)]
struct SqlitePragmas;
#[cfg(not(feature = "pg"))]
impl diesel::r2d2::CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
  fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
    diesel::sql_query("PRAGMA busy_timeout = 5000;").execute(conn).map_err(diesel::r2d2::Error::QueryError)?;
    Ok(())
  }
}

/// Repo Diesel que implementa `CedenteRepository`.
pub struct DieselCedenteRepository {
  pool: Arc<DbPool>,
}

impl DieselCedenteRepository {
  /// Abre o pool e aplica as migrações pendentes.
  pub fn new(database_url: &str) -> Result<Self, DomainError> {
    let url = prepare_url(database_url)?;
    let manager = ConnectionManager::<DbConn>::new(url.as_str());
    let builder = Pool::builder().max_size(4);
    #[cfg(not(feature = "pg"))]
    let builder = builder.connection_customizer(Box::new(SqlitePragmas));
    let pool = builder.build(manager)
                      .map_err(|e| DomainError::ExternalError(format!("não foi possível criar o pool de conexões: {}", e)))?;
    let repo = DieselCedenteRepository { pool: Arc::new(pool) };
    let mut c = repo.conn()?;
    enable_wal(&mut c);
    let applied =
      c.run_pending_migrations(MIGRATIONS).map_err(|e| DomainError::ExternalError(format!("migrações: {}", e)))?;
    if !applied.is_empty() {
      log::info!("{} migração(ões) aplicada(s)", applied.len());
    }
    drop(c);
    Ok(repo)
  }

  fn conn(&self) -> Result<PooledConnection<ConnectionManager<DbConn>>, DomainError> {
    self.pool.get().map_err(|e| DomainError::ExternalError(format!("pool: {}", e)))
  }
}

#[cfg(not(feature = "pg"))]
fn enable_wal(conn: &mut DbConn) {
  if let Err(e) = diesel::sql_query("PRAGMA journal_mode = WAL;").execute(conn) {
    log::warn!("não foi possível ativar WAL: {}", e);
  }
}

#[cfg(feature = "pg")]
fn enable_wal(_conn: &mut DbConn) {}

#[cfg(not(feature = "pg"))]
fn prepare_url(database_url: &str) -> Result<String, DomainError> {
  use std::path::Path;
  let path = database_url.strip_prefix("sqlite://").or_else(|| database_url.strip_prefix("sqlite:")).unwrap_or(database_url);
  if !path.starts_with("file:") && path != ":memory:" {
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
      std::fs::create_dir_all(parent).map_err(|e| {
                                        DomainError::ExternalError(format!("não foi possível criar {}: {}",
                                                                           parent.display(),
                                                                           e))
                                      })?;
    }
  }
  Ok(path.to_string())
}

#[cfg(feature = "pg")]
fn prepare_url(database_url: &str) -> Result<String, DomainError> {
  Ok(database_url.to_string())
}

/// URL do banco a partir do ambiente (`.env` incluído):
/// `GOLDCREDIT_DB_URL`, depois `DATABASE_URL`.
#[cfg(feature = "pg")]
pub fn database_url_from_env() -> Result<String, DomainError> {
  dotenvy::dotenv().ok();
  let url = env_url().ok_or_else(|| DomainError::ExternalError("GOLDCREDIT_DB_URL / DATABASE_URL não definida".into()))?;
  if !looks_like_postgres(&url) {
    return Err(DomainError::ExternalError("GOLDCREDIT_DB_URL / DATABASE_URL não parece uma URL Postgres".into()));
  }
  Ok(url)
}

#[cfg(not(feature = "pg"))]
pub fn database_url_from_env() -> Result<String, DomainError> {
  dotenvy::dotenv().ok();
  match env_url() {
    Some(url) if looks_like_postgres(&url) => {
      Err(DomainError::ExternalError("cedente-persistence foi compilado sem a feature 'pg'; habilite-a para usar \
                                      Postgres"
                                               .into()))
    }
    Some(url) => Ok(url),
    None => Ok(DEFAULT_SQLITE_PATH.to_string()),
  }
}

fn env_url() -> Option<String> {
  std::env::var("GOLDCREDIT_DB_URL").or_else(|_| std::env::var("DATABASE_URL")).ok().filter(|u| !u.trim().is_empty())
}

fn looks_like_postgres(url: &str) -> bool {
  let l = url.to_lowercase();
  l.starts_with("postgres://") || l.starts_with("postgresql://") || url.contains('@')
}

pub fn new_from_env() -> Result<DieselCedenteRepository, DomainError> {
  let url = database_url_from_env()?;
  log::info!("banco de dados: {} ({})", backend_name(), redact(&url));
  DieselCedenteRepository::new(&url)
}

fn redact(url: &str) -> String {
  match (url.find("://"), url.rfind('@')) {
    (Some(scheme), Some(at)) if at > scheme => format!("{}://***{}", &url[..scheme], &url[at..]),
    _ => url.to_string(),
  }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = schema::cedentes)]
struct CedenteRow {
  id: i32,
  nome_razao_social: String,
  cpf_cnpj: String,
  status: String,
  validade_contrato: Option<NaiveDate>,
  observacoes: Option<String>,
  created_at: NaiveDateTime,
  updated_at: NaiveDateTime,
}

impl CedenteRow {
  fn into_cedente(self, documentos: DocumentChecklist) -> Cedente {
    let status = ContractStatus::from_key(&self.status).unwrap_or_else(|| {
                                                          log::warn!("cedente {}: status desconhecido '{}'",
                                                                     self.id,
                                                                     self.status);
                                                          ContractStatus::default()
                                                        });
    Cedente { id: self.id,
              nome_razao_social: self.nome_razao_social,
              cpf_cnpj: Documento::from_stored(&self.cpf_cnpj),
              status,
              validade_contrato: self.validade_contrato,
              observacoes: self.observacoes,
              documentos,
              created_at: self.created_at,
              updated_at: self.updated_at }
  }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = schema::cedentes)]
struct NewCedenteRow<'a> {
  nome_razao_social: &'a str,
  cpf_cnpj: &'a str,
  status: &'a str,
  validade_contrato: Option<NaiveDate>,
  observacoes: Option<&'a str>,
  created_at: NaiveDateTime,
  updated_at: NaiveDateTime,
}

#[derive(Debug, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = schema::documentos_cedente)]
struct DocumentosRow {
  cedente_id: i32,
  contrato_social: bool,
  cartao_cnpj: bool,
  faturamento_12meses: bool,
  dre_balanco: bool,
  cnh_rg_socios: bool,
  ir_socios: bool,
  comprovante_endereco: bool,
  email: bool,
  curva_abc: bool,
  dados_bancarios: bool,
  updated_at: NaiveDateTime,
}

impl DocumentosRow {
  fn from_checklist(cedente_id: i32, d: &DocumentChecklist) -> Self {
    DocumentosRow { cedente_id,
                    contrato_social: d.contrato_social,
                    cartao_cnpj: d.cartao_cnpj,
                    faturamento_12meses: d.faturamento_12meses,
                    dre_balanco: d.dre_balanco,
                    cnh_rg_socios: d.cnh_rg_socios,
                    ir_socios: d.ir_socios,
                    comprovante_endereco: d.comprovante_endereco,
                    email: d.email,
                    curva_abc: d.curva_abc,
                    dados_bancarios: d.dados_bancarios,
                    updated_at: now() }
  }

  fn to_checklist(&self) -> DocumentChecklist {
    DocumentChecklist { contrato_social: self.contrato_social,
                        cartao_cnpj: self.cartao_cnpj,
                        faturamento_12meses: self.faturamento_12meses,
                        dre_balanco: self.dre_balanco,
                        cnh_rg_socios: self.cnh_rg_socios,
                        ir_socios: self.ir_socios,
                        comprovante_endereco: self.comprovante_endereco,
                        email: self.email,
                        curva_abc: self.curva_abc,
                        dados_bancarios: self.dados_bancarios }
  }
}

#[derive(Debug, Queryable, Selectable)]
#[diesel(table_name = schema::notificacoes)]
struct NotificacaoRow {
  id: i32,
  cedente_id: Option<i32>,
  tipo: String,
  titulo: String,
  mensagem: String,
  lida: bool,
  created_at: NaiveDateTime,
  data_vencimento: Option<NaiveDate>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = schema::notificacoes)]
struct NewNotificacaoRow<'a> {
  cedente_id: Option<i32>,
  tipo: &'a str,
  titulo: &'a str,
  mensagem: &'a str,
  lida: bool,
  created_at: NaiveDateTime,
  data_vencimento: Option<NaiveDate>,
}

#[derive(QueryableByName)]
struct LastId {
  #[diesel(sql_type = BigInt)]
  id: i64,
}

fn now() -> NaiveDateTime {
  Local::now().naive_local().trunc_subsecs(6)
}

fn map_db_err(e: DieselError) -> DomainError {
  match e {
    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
      DomainError::Conflict(format!("CPF/CNPJ já cadastrado ({})", info.message()))
    }
    other => DomainError::ExternalError(format!("db: {}", other)),
  }
}

fn load_documents(conn: &mut DbConn, cedente: i32) -> QueryResult<DocumentChecklist> {
  let row = doc_dsl::documentos_cedente.filter(doc_dsl::cedente_id.eq(cedente))
                                       .select(DocumentosRow::as_select())
                                       .first(conn)
                                       .optional()?;
  Ok(row.map(|r| r.to_checklist()).unwrap_or_default())
}

fn fetch(conn: &mut DbConn, cedente: i32) -> QueryResult<Option<Cedente>> {
  let row = ced_dsl::cedentes.find(cedente).select(CedenteRow::as_select()).first(conn).optional()?;
  match row {
    Some(r) => {
      let docs = load_documents(conn, cedente)?;
      Ok(Some(r.into_cedente(docs)))
    }
    None => Ok(None),
  }
}

fn exists(conn: &mut DbConn, cedente: i32) -> QueryResult<bool> {
  Ok(ced_dsl::cedentes.find(cedente).select(ced_dsl::id).first::<i32>(conn).optional()?.is_some())
}

impl CedenteRepository for DieselCedenteRepository {
  fn create(&self, cedente: NewCedente) -> Result<Cedente, DomainError> {
    let mut conn = self.conn()?;
    let ts = now();
    let row = NewCedenteRow { nome_razao_social: &cedente.nome_razao_social,
                              cpf_cnpj: cedente.cpf_cnpj.digits(),
                              status: cedente.status.key(),
                              validade_contrato: cedente.validade_contrato,
                              observacoes: cedente.observacoes.as_deref(),
                              created_at: ts,
                              updated_at: ts };
    match diesel::insert_into(ced_dsl::cedentes).values(&row).execute(&mut conn).map_err(map_db_err) {
      Err(DomainError::Conflict(_)) => {
        return Err(DomainError::Conflict(format!("CPF/CNPJ {} já cadastrado", cedente.cpf_cnpj.formatted())));
      }
      other => other?,
    };
    let stored = ced_dsl::cedentes.filter(ced_dsl::cpf_cnpj.eq(cedente.cpf_cnpj.digits()))
                                  .select(CedenteRow::as_select())
                                  .first(&mut conn)
                                  .map_err(map_db_err)?;
    Ok(stored.into_cedente(DocumentChecklist::default()))
  }

  fn get(&self, id: i32) -> Result<Option<Cedente>, DomainError> {
    let mut conn = self.conn()?;
    fetch(&mut conn, id).map_err(map_db_err)
  }

  fn find_by_documento(&self, documento: &Documento) -> Result<Option<Cedente>, DomainError> {
    let mut conn = self.conn()?;
    let row = ced_dsl::cedentes.filter(ced_dsl::cpf_cnpj.eq(documento.digits()))
                               .select(CedenteRow::as_select())
                               .first(&mut conn)
                               .optional()
                               .map_err(map_db_err)?;
    match row {
      Some(r) => {
        let docs = load_documents(&mut conn, r.id).map_err(map_db_err)?;
        Ok(Some(r.into_cedente(docs)))
      }
      None => Ok(None),
    }
  }

  fn list(&self, filter: &CedenteFilter) -> Result<Vec<Cedente>, DomainError> {
    let mut conn = self.conn()?;
    let mut query = ced_dsl::cedentes.select(CedenteRow::as_select()).into_boxed();
    if let Some(status) = filter.status {
      query = query.filter(ced_dsl::status.eq(status.key()));
    }
    let rows: Vec<CedenteRow> = query.load(&mut conn).map_err(map_db_err)?;
    let docs: HashMap<i32, DocumentChecklist> =
      doc_dsl::documentos_cedente.select(DocumentosRow::as_select())
                                 .load::<DocumentosRow>(&mut conn)
                                 .map_err(map_db_err)?
                                 .into_iter()
                                 .map(|r| (r.cedente_id, r.to_checklist()))
                                 .collect();
    // a busca ignora acentos, então é feita aqui e não no SQL
    let mut out: Vec<Cedente> = rows.into_iter()
                                    .map(|r| {
                                      let d = docs.get(&r.id).copied().unwrap_or_default();
                                      r.into_cedente(d)
                                    })
                                    .filter(|c| c.matches(filter))
                                    .collect();
    out.sort_by_key(|c| c.sort_key());
    Ok(out)
  }

  fn update(&self, id: i32, cedente: NewCedente) -> Result<Option<Cedente>, DomainError> {
    let mut conn = self.conn()?;
    if !exists(&mut conn, id).map_err(map_db_err)? {
      return Ok(None);
    }
    let owner = ced_dsl::cedentes.filter(ced_dsl::cpf_cnpj.eq(cedente.cpf_cnpj.digits()))
                                 .filter(ced_dsl::id.ne(id))
                                 .select(ced_dsl::id)
                                 .first::<i32>(&mut conn)
                                 .optional()
                                 .map_err(map_db_err)?;
    if owner.is_some() {
      return Err(DomainError::Conflict(format!("CPF/CNPJ {} já cadastrado", cedente.cpf_cnpj.formatted())));
    }
    diesel::update(ced_dsl::cedentes.find(id)).set((ced_dsl::nome_razao_social.eq(&cedente.nome_razao_social),
                                                     ced_dsl::cpf_cnpj.eq(cedente.cpf_cnpj.digits()),
                                                     ced_dsl::status.eq(cedente.status.key()),
                                                     ced_dsl::validade_contrato.eq(cedente.validade_contrato),
                                                     ced_dsl::observacoes.eq(cedente.observacoes.as_deref()),
                                                     ced_dsl::updated_at.eq(now())))
                                              .execute(&mut conn)
                                              .map_err(map_db_err)?;
    fetch(&mut conn, id).map_err(map_db_err)
  }

  fn delete(&self, id: i32) -> Result<bool, DomainError> {
    let mut conn = self.conn()?;
    let removed = conn.transaction::<_, DieselError, _>(|c| {
                        diesel::delete(not_dsl::notificacoes.filter(not_dsl::cedente_id.eq(id))).execute(c)?;
                        diesel::delete(doc_dsl::documentos_cedente.filter(doc_dsl::cedente_id.eq(id))).execute(c)?;
                        diesel::delete(ced_dsl::cedentes.find(id)).execute(c)
                      })
                      .map_err(map_db_err)?;
    Ok(removed > 0)
  }

  fn delete_all(&self) -> Result<usize, DomainError> {
    let mut conn = self.conn()?;
    conn.transaction::<_, DieselError, _>(|c| {
          diesel::delete(not_dsl::notificacoes).execute(c)?;
          diesel::delete(doc_dsl::documentos_cedente).execute(c)?;
          diesel::delete(ced_dsl::cedentes).execute(c)
        })
        .map_err(map_db_err)
  }

  fn get_documents(&self, id: i32) -> Result<Option<DocumentChecklist>, DomainError> {
    let mut conn = self.conn()?;
    if !exists(&mut conn, id).map_err(map_db_err)? {
      return Ok(None);
    }
    load_documents(&mut conn, id).map(Some).map_err(map_db_err)
  }

  fn save_documents(&self, id: i32, documents: &DocumentChecklist) -> Result<bool, DomainError> {
    let mut conn = self.conn()?;
    let row = DocumentosRow::from_checklist(id, documents);
    conn.transaction::<_, DieselError, _>(|c| {
          if !exists(c, id)? {
            return Ok(false);
          }
          let changed =
            diesel::update(doc_dsl::documentos_cedente.filter(doc_dsl::cedente_id.eq(id))).set(&row).execute(c)?;
          if changed == 0 {
            diesel::insert_into(doc_dsl::documentos_cedente).values(&row).execute(c)?;
          }
          Ok(true)
        })
        .map_err(map_db_err)
  }

  fn count_by_status(&self) -> Result<Vec<(ContractStatus, i64)>, DomainError> {
    let mut conn = self.conn()?;
    let rows: Vec<(String, i64)> = ced_dsl::cedentes.group_by(ced_dsl::status)
                                                    .select((ced_dsl::status, diesel::dsl::count_star()))
                                                    .load(&mut conn)
                                                    .map_err(map_db_err)?;
    let mut out = Vec::with_capacity(rows.len());
    for (key, n) in rows {
      match ContractStatus::from_key(&key) {
        Some(s) => out.push((s, n)),
        None => log::warn!("contagem por status: chave desconhecida '{}' ({} cedentes)", key, n),
      }
    }
    out.sort_by_key(|(s, _)| *s);
    Ok(out)
  }

  fn create_notification(&self, notification: NewNotification) -> Result<i32, DomainError> {
    let mut conn = self.conn()?;
    let row = NewNotificacaoRow { cedente_id: notification.cedente_id,
                                  tipo: notification.kind.as_str(),
                                  titulo: &notification.titulo,
                                  mensagem: &notification.mensagem,
                                  lida: false,
                                  created_at: now(),
                                  data_vencimento: notification.data_vencimento };
    let last = conn.transaction::<_, DieselError, _>(|c| {
                     diesel::insert_into(not_dsl::notificacoes).values(&row).execute(c)?;
                     diesel::sql_query(LAST_ID_SQL).get_result::<LastId>(c)
                   })
                   .map_err(map_db_err)?;
    i32::try_from(last.id).map_err(|_| DomainError::ExternalError(format!("id de notificação fora do intervalo: {}", last.id)))
  }

  fn unread_notifications(&self) -> Result<Vec<Notification>, DomainError> {
    let mut conn = self.conn()?;
    let rows: Vec<NotificacaoRow> = not_dsl::notificacoes.filter(not_dsl::lida.eq(false))
                                                         .order((not_dsl::created_at.desc(), not_dsl::id.desc()))
                                                         .select(NotificacaoRow::as_select())
                                                         .load(&mut conn)
                                                         .map_err(map_db_err)?;
    let ids: Vec<i32> = rows.iter().filter_map(|r| r.cedente_id).collect();
    let nomes: HashMap<i32, String> = ced_dsl::cedentes.filter(ced_dsl::id.eq_any(ids))
                                                       .select((ced_dsl::id, ced_dsl::nome_razao_social))
                                                       .load::<(i32, String)>(&mut conn)
                                                       .map_err(map_db_err)?
                                                       .into_iter()
                                                       .collect();
    rows.into_iter()
        .map(|r| -> Result<Notification, DomainError> {
          Ok(Notification { id: r.id,
                            cedente_id: r.cedente_id,
                            cedente_nome: r.cedente_id.and_then(|id| nomes.get(&id).cloned()),
                            kind: r.tipo.parse::<NotificationKind>()?,
                            titulo: r.titulo,
                            mensagem: r.mensagem,
                            lida: r.lida,
                            created_at: r.created_at,
                            data_vencimento: r.data_vencimento })
        })
        .collect()
  }

  fn has_unread_notification(&self,
                             cedente_id: i32,
                             kind: NotificationKind,
                             data_vencimento: Option<NaiveDate>)
                             -> Result<bool, DomainError> {
    let mut conn = self.conn()?;
    let mut query = not_dsl::notificacoes.select(not_dsl::id)
                                         .filter(not_dsl::lida.eq(false))
                                         .filter(not_dsl::cedente_id.eq(cedente_id))
                                         .filter(not_dsl::tipo.eq(kind.as_str()))
                                         .into_boxed();
    query = match data_vencimento {
      Some(d) => query.filter(not_dsl::data_vencimento.eq(d)),
      None => query.filter(not_dsl::data_vencimento.is_null()),
    };
    let found = query.first::<i32>(&mut conn).optional().map_err(map_db_err)?;
    Ok(found.is_some())
  }

  fn mark_notification_read(&self, id: i32) -> Result<bool, DomainError> {
    let mut conn = self.conn()?;
    let n = diesel::update(not_dsl::notificacoes.find(id)).set(not_dsl::lida.eq(true))
                                                          .execute(&mut conn)
                                                          .map_err(map_db_err)?;
    Ok(n > 0)
  }

  fn mark_all_notifications_read(&self) -> Result<usize, DomainError> {
    let mut conn = self.conn()?;
    diesel::update(not_dsl::notificacoes.filter(not_dsl::lida.eq(false))).set(not_dsl::lida.eq(true))
                                                                        .execute(&mut conn)
                                                                        .map_err(map_db_err)
  }

  fn purge_read_notifications(&self, older_than: NaiveDateTime) -> Result<usize, DomainError> {
    let mut conn = self.conn()?;
    diesel::delete(not_dsl::notificacoes.filter(not_dsl::lida.eq(true)).filter(not_dsl::created_at.lt(older_than)))
      .execute(&mut conn)
      .map_err(map_db_err)
  }

  fn count_unread_notifications(&self) -> Result<i64, DomainError> {
    let mut conn = self.conn()?;
    not_dsl::notificacoes.filter(not_dsl::lida.eq(false)).count().get_result(&mut conn).map_err(map_db_err)
  }
}
