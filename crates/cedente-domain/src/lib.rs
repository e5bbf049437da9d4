mod cedente;
mod checklist;
pub mod dates;
mod documento;
mod domain_repository;
mod errors;
pub mod import;
pub mod notifications;
mod service;
pub mod stats;
mod status;
pub mod text;

pub use cedente::{validate_nome, Cedente, CedenteFilter, CedenteInput, ExpiryStatus, NewCedente,
                  DEFAULT_EXPIRY_WINDOW_DAYS, NOME_MAX_LEN, NOME_MIN_LEN};
pub use checklist::DocumentChecklist;
pub use documento::{Documento, DocumentoKind};
pub use domain_repository::{CedenteRepository, InMemoryCedenteRepository};
pub use errors::DomainError;
pub use import::{ImportReport, ImportRow, RowIssue};
pub use notifications::{NewNotification, Notification, NotificationCheckReport, NotificationKind};
pub use service::CedenteService;
pub use stats::{DashboardStats, StatusCount};
pub use status::ContractStatus;
