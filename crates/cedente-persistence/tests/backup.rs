#![cfg(not(feature = "pg"))]
use cedente_domain::{CedenteFilter, CedenteRepository, NewCedente};
use cedente_persistence::{BackupError, BackupManager, DieselCedenteRepository};
use std::fs;

#[test]
fn create_list_restore() {
  let dir = tempfile::tempdir().expect("tempdir");
  let db = dir.path().join("cedentes.db");
  let backups = dir.path().join("backups");
  let repo = DieselCedenteRepository::new(db.to_str().unwrap()).expect("repo");
  repo.create(NewCedente::new("Maria Silva", "52998224725").unwrap()).unwrap();

  let manager = BackupManager::new(&db, &backups);
  let info = manager.create("manual").expect("backup");
  assert!(info.filename.starts_with("cedentes_backup_"));
  assert!(info.filename.ends_with("_manual.db"));
  assert!(info.size_bytes > 0);
  assert_eq!(info.reason, "manual");

  repo.create(NewCedente::new("Acme Ltda", "11222333000181").unwrap()).unwrap();
  assert_eq!(repo.list(&CedenteFilter::default()).unwrap().len(), 2);
  drop(repo);

  let snapshot = manager.restore(&info.filename).expect("restore").expect("pre-restore snapshot");
  assert_eq!(snapshot.reason, "pre_restauracao");

  let repo = DieselCedenteRepository::new(db.to_str().unwrap()).expect("reopen");
  let restored = repo.list(&CedenteFilter::default()).unwrap();
  assert_eq!(restored.len(), 1);
  assert_eq!(restored[0].nome_razao_social, "Maria Silva");

  let stats = manager.stats().unwrap();
  assert_eq!(stats.total_backups, 2);
  assert!(stats.total_size_bytes > 0);
}

#[test]
fn restore_rejects_bad_names() {
  let dir = tempfile::tempdir().expect("tempdir");
  let manager = BackupManager::new(dir.path().join("x.db"), dir.path());
  assert!(matches!(manager.restore("../etc/passwd"), Err(BackupError::InvalidName(_))));
  assert!(matches!(manager.restore("cedentes_backup_20250101_020000_manual.db"), Err(BackupError::NotFound(_))));
}

#[test]
fn prune_keeps_recent_backups() {
  let dir = tempfile::tempdir().expect("tempdir");
  let manager = BackupManager::new(dir.path().join("x.db"), dir.path()).with_keep(2).with_keep_days(7);
  for day in 1..=4 {
    fs::write(dir.path().join(format!("cedentes_backup_2020010{}_020000_automatico.db", day)), b"x").unwrap();
  }
  fs::write(dir.path().join("outro.db"), b"x").unwrap();
  assert_eq!(manager.prune().unwrap(), 2);
  let names: Vec<_> = manager.list().unwrap().into_iter().map(|b| b.filename).collect();
  assert_eq!(names,
             vec!["cedentes_backup_20200104_020000_automatico.db", "cedentes_backup_20200103_020000_automatico.db"]);
  assert!(dir.path().join("outro.db").exists());
}
