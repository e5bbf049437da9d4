use crate::{Cedente, CedenteFilter, ContractStatus, DocumentChecklist, Documento, DomainError, NewCedente, NewNotification,
            Notification, NotificationKind};
use chrono::{Local, NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Trait que define as operações de persistência do cadastro de cedentes.
pub trait CedenteRepository: Send + Sync {
    /// Insere um cedente. `Conflict` se o CPF/CNPJ já estiver cadastrado.
    fn create(&self, cedente: NewCedente) -> Result<Cedente, DomainError>;

    fn get(&self, id: i32) -> Result<Option<Cedente>, DomainError>;

    fn find_by_documento(&self, documento: &Documento) -> Result<Option<Cedente>, DomainError>;

    /// Lista filtrada, ordenada por nome (minúsculo, sem espaços nas pontas).
    fn list(&self, filter: &CedenteFilter) -> Result<Vec<Cedente>, DomainError>;

    /// Substitui os dados do cedente. `Ok(None)` quando o id não existe e
    /// `Conflict` quando o novo documento pertence a outro cedente.
    fn update(&self, id: i32, cedente: NewCedente) -> Result<Option<Cedente>, DomainError>;

    /// Remove o cedente junto com seu checklist e suas notificações.
    fn delete(&self, id: i32) -> Result<bool, DomainError>;

    fn delete_all(&self) -> Result<usize, DomainError>;

    /// Checklist do cedente (padrão tudo `false` se nunca foi salvo);
    /// `None` quando o cedente não existe.
    fn get_documents(&self, id: i32) -> Result<Option<DocumentChecklist>, DomainError>;

    /// Devolve `false` quando o cedente não existe.
    fn save_documents(&self, id: i32, documents: &DocumentChecklist) -> Result<bool, DomainError>;

    fn count_by_status(&self) -> Result<Vec<(ContractStatus, i64)>, DomainError>;

    fn create_notification(&self, notification: NewNotification) -> Result<i32, DomainError>;

    /// Notificações não lidas, mais recentes primeiro.
    fn unread_notifications(&self) -> Result<Vec<Notification>, DomainError>;

    /// Existe notificação não lida igual (mesmo cedente, tipo e vencimento)?
    fn has_unread_notification(&self,
                               cedente_id: i32,
                               kind: NotificationKind,
                               data_vencimento: Option<NaiveDate>)
                               -> Result<bool, DomainError>;

    /// Marca como lida. `true` quando a notificação existe, mesmo que já
    /// estivesse lida.
    fn mark_notification_read(&self, id: i32) -> Result<bool, DomainError>;

    fn mark_all_notifications_read(&self) -> Result<usize, DomainError>;

    /// Apaga notificações lidas criadas antes de `older_than`.
    fn purge_read_notifications(&self, older_than: NaiveDateTime) -> Result<usize, DomainError>;

    fn count_unread_notifications(&self) -> Result<i64, DomainError>;
}

#[derive(Default)]
struct Tables {
    next_cedente_id: i32,
    next_notification_id: i32,
    cedentes: HashMap<i32, Cedente>,
    notifications: HashMap<i32, Notification>,
}

/// Implementação em memória para testes e desenvolvimento.
pub struct InMemoryCedenteRepository {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryCedenteRepository {
    pub fn new() -> Self {
        Self { tables: Arc::new(Mutex::new(Tables::default())) }
    }

    // Helper to map poisoned mutex errors into DomainError
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Tables>, DomainError> {
        self.tables
            .lock()
            .map_err(|e| DomainError::ExternalError(format!("Mutex 'tables' poisoned: {}", e)))
    }

    fn now() -> NaiveDateTime {
        Local::now().naive_local()
    }
}

impl Default for InMemoryCedenteRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn duplicate(doc: &Documento) -> DomainError {
    DomainError::Conflict(format!("CPF/CNPJ {} já cadastrado", doc.formatted()))
}

impl CedenteRepository for InMemoryCedenteRepository {
    fn create(&self, cedente: NewCedente) -> Result<Cedente, DomainError> {
        let mut t = self.lock()?;
        if t.cedentes.values().any(|c| c.cpf_cnpj == cedente.cpf_cnpj) {
            return Err(duplicate(&cedente.cpf_cnpj));
        }
        t.next_cedente_id += 1;
        let now = Self::now();
        let row = Cedente { id: t.next_cedente_id,
                            nome_razao_social: cedente.nome_razao_social,
                            cpf_cnpj: cedente.cpf_cnpj,
                            status: cedente.status,
                            validade_contrato: cedente.validade_contrato,
                            observacoes: cedente.observacoes,
                            documentos: DocumentChecklist::default(),
                            created_at: now,
                            updated_at: now };
        t.cedentes.insert(row.id, row.clone());
        Ok(row)
    }

    fn get(&self, id: i32) -> Result<Option<Cedente>, DomainError> {
        Ok(self.lock()?.cedentes.get(&id).cloned())
    }

    fn find_by_documento(&self, documento: &Documento) -> Result<Option<Cedente>, DomainError> {
        Ok(self.lock()?.cedentes.values().find(|c| &c.cpf_cnpj == documento).cloned())
    }

    fn list(&self, filter: &CedenteFilter) -> Result<Vec<Cedente>, DomainError> {
        let t = self.lock()?;
        let mut out: Vec<Cedente> = t.cedentes.values().filter(|c| c.matches(filter)).cloned().collect();
        out.sort_by_key(|c| c.sort_key());
        Ok(out)
    }

    fn update(&self, id: i32, cedente: NewCedente) -> Result<Option<Cedente>, DomainError> {
        let mut t = self.lock()?;
        if t.cedentes.values().any(|c| c.id != id && c.cpf_cnpj == cedente.cpf_cnpj) {
            return Err(duplicate(&cedente.cpf_cnpj));
        }
        let Some(row) = t.cedentes.get_mut(&id) else {
            return Ok(None);
        };
        row.nome_razao_social = cedente.nome_razao_social;
        row.cpf_cnpj = cedente.cpf_cnpj;
        row.status = cedente.status;
        row.validade_contrato = cedente.validade_contrato;
        row.observacoes = cedente.observacoes;
        row.updated_at = Self::now();
        Ok(Some(row.clone()))
    }

    fn delete(&self, id: i32) -> Result<bool, DomainError> {
        let mut t = self.lock()?;
        let removed = t.cedentes.remove(&id).is_some();
        if removed {
            t.notifications.retain(|_, n| n.cedente_id != Some(id));
        }
        Ok(removed)
    }

    fn delete_all(&self) -> Result<usize, DomainError> {
        let mut t = self.lock()?;
        let removed = t.cedentes.len();
        t.cedentes.clear();
        t.notifications.retain(|_, n| n.cedente_id.is_none());
        Ok(removed)
    }

    fn get_documents(&self, id: i32) -> Result<Option<DocumentChecklist>, DomainError> {
        Ok(self.lock()?.cedentes.get(&id).map(|c| c.documentos))
    }

    fn save_documents(&self, id: i32, documents: &DocumentChecklist) -> Result<bool, DomainError> {
        let mut t = self.lock()?;
        match t.cedentes.get_mut(&id) {
            Some(c) => {
                c.documentos = *documents;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn count_by_status(&self) -> Result<Vec<(ContractStatus, i64)>, DomainError> {
        let t = self.lock()?;
        let mut counts: HashMap<ContractStatus, i64> = HashMap::new();
        for c in t.cedentes.values() {
            *counts.entry(c.status).or_insert(0) += 1;
        }
        let mut out: Vec<(ContractStatus, i64)> = counts.into_iter().collect();
        out.sort();
        Ok(out)
    }

    fn create_notification(&self, notification: NewNotification) -> Result<i32, DomainError> {
        let mut t = self.lock()?;
        t.next_notification_id += 1;
        let id = t.next_notification_id;
        let cedente_nome = notification.cedente_id
                                       .and_then(|cid| t.cedentes.get(&cid))
                                       .map(|c| c.nome_razao_social.clone());
        t.notifications.insert(id,
                               Notification { id,
                                              cedente_id: notification.cedente_id,
                                              cedente_nome,
                                              kind: notification.kind,
                                              titulo: notification.titulo,
                                              mensagem: notification.mensagem,
                                              lida: false,
                                              created_at: Self::now(),
                                              data_vencimento: notification.data_vencimento });
        Ok(id)
    }

    fn unread_notifications(&self) -> Result<Vec<Notification>, DomainError> {
        let t = self.lock()?;
        let mut out: Vec<Notification> = t.notifications.values().filter(|n| !n.lida).cloned().collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(out)
    }

    fn has_unread_notification(&self,
                               cedente_id: i32,
                               kind: NotificationKind,
                               data_vencimento: Option<NaiveDate>)
                               -> Result<bool, DomainError> {
        let t = self.lock()?;
        Ok(t.notifications.values().any(|n| {
                                     !n.lida
                                     && n.cedente_id == Some(cedente_id)
                                     && n.kind == kind
                                     && n.data_vencimento == data_vencimento
                                   }))
    }

    fn mark_notification_read(&self, id: i32) -> Result<bool, DomainError> {
        let mut t = self.lock()?;
        match t.notifications.get_mut(&id) {
            Some(n) => {
                n.lida = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn mark_all_notifications_read(&self) -> Result<usize, DomainError> {
        let mut t = self.lock()?;
        let mut count = 0;
        for notification in t.notifications.values_mut().filter(|n| !n.lida) {
            notification.lida = true;
            count += 1;
        }
        Ok(count)
    }

    fn purge_read_notifications(&self, older_than: NaiveDateTime) -> Result<usize, DomainError> {
        let mut t = self.lock()?;
        let before = t.notifications.len();
        t.notifications.retain(|_, n| !(n.lida && n.created_at < older_than));
        Ok(before - t.notifications.len())
    }

    fn count_unread_notifications(&self) -> Result<i64, DomainError> {
        Ok(self.lock()?.notifications.values().filter(|n| !n.lida).count() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_cedente(nome: &str, doc: &str) -> NewCedente {
        NewCedente::new(nome, doc).expect("valid cedente")
    }

    #[test]
    fn create_get_and_duplicate_document() -> Result<(), DomainError> {
        let repo = InMemoryCedenteRepository::new();
        let c = repo.create(new_cedente("Maria Silva", "529.982.247-25"))?;
        assert_eq!(repo.get(c.id)?.map(|c| c.nome_razao_social), Some("Maria Silva".to_string()));
        match repo.create(new_cedente("Outra", "52998224725")) {
            Err(DomainError::Conflict(_)) => {}
            other => panic!("expected conflict, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn list_is_sorted_by_trimmed_lowercase_name() -> Result<(), DomainError> {
        let repo = InMemoryCedenteRepository::new();
        repo.create(new_cedente("zeta comércio", "11222333000181"))?;
        repo.create(new_cedente("Alfa Ltda", "52998224725"))?;
        repo.create(new_cedente("beta", "11144477735"))?;
        let names: Vec<String> =
            repo.list(&CedenteFilter::default())?.into_iter().map(|c| c.nome_razao_social).collect();
        assert_eq!(names, vec!["Alfa Ltda", "beta", "zeta comércio"]);
        Ok(())
    }

    #[test]
    fn update_rejects_document_of_another_cedente() -> Result<(), DomainError> {
        let repo = InMemoryCedenteRepository::new();
        let a = repo.create(new_cedente("Alfa", "52998224725"))?;
        repo.create(new_cedente("Beta", "11144477735"))?;
        assert!(matches!(repo.update(a.id, new_cedente("Alfa", "11144477735")), Err(DomainError::Conflict(_))));
        assert!(repo.update(999, new_cedente("X y", "01234567890"))?.is_none());
        let updated = repo.update(a.id, new_cedente("Alfa Nova", "52998224725"))?.expect("exists");
        assert_eq!(updated.nome_razao_social, "Alfa Nova");
        Ok(())
    }

    #[test]
    fn delete_cascades_notifications() -> Result<(), DomainError> {
        let repo = InMemoryCedenteRepository::new();
        let a = repo.create(new_cedente("Alfa", "52998224725"))?;
        repo.create_notification(NewNotification { cedente_id: Some(a.id),
                                                   kind: NotificationKind::DocumentosPendentes,
                                                   titulo: "Documentos pendentes".into(),
                                                   mensagem: "Alfa".into(),
                                                   data_vencimento: None })?;
        assert_eq!(repo.count_unread_notifications()?, 1);
        assert!(repo.delete(a.id)?);
        assert!(!repo.delete(a.id)?);
        assert_eq!(repo.count_unread_notifications()?, 0);
        Ok(())
    }

    #[test]
    fn marking_read_twice_reports_existence() -> Result<(), DomainError> {
        let repo = InMemoryCedenteRepository::new();
        let id = repo.create_notification(NewNotification { cedente_id: None,
                                                            kind: NotificationKind::Vencimento,
                                                            titulo: "Contrato vence em 7 dias".into(),
                                                            mensagem: "Aviso".into(),
                                                            data_vencimento: None })?;
        assert!(repo.mark_notification_read(id)?);
        assert!(repo.mark_notification_read(id)?);
        assert!(!repo.mark_notification_read(id + 1)?);
        assert_eq!(repo.count_unread_notifications()?, 0);
        Ok(())
    }

    #[test]
    fn mutex_poisoning_returns_error() {
        use std::thread;

        let repo = InMemoryCedenteRepository::new();
        let tables = repo.tables.clone();
        let handle = thread::spawn(move || {
            let _g = tables.lock().unwrap();
            panic!("force poison");
        });
        let _ = handle.join();

        match repo.list(&CedenteFilter::default()) {
            Err(DomainError::ExternalError(_)) => (),
            other => panic!("expected ExternalError, got {:?}", other),
        }
    }
}
