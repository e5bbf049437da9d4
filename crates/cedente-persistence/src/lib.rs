//! Persistência do cadastro de cedentes com Diesel (SQLite por padrão,
//! Postgres com a feature `pg`) e backups do arquivo SQLite.

pub mod backup;
mod diesel_repository;
pub mod schema;

pub use backup::{sqlite_file_path, BackupError, BackupInfo, BackupManager, BackupStats};
pub use diesel_repository::{backend_name, database_url_from_env, new_from_env, DieselCedenteRepository, DEFAULT_SQLITE_PATH};
