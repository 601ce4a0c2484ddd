//! Audit trail entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Record;

wire_enum! {
    /// Outcome of an audited action.
    AuditStatus, "audit status" {
        Success => "sucesso",
        Failed => "falha",
        Blocked => "bloqueado",
    }
}

wire_enum! {
    /// Category of an audited action.
    LogType, "log type" {
        Read => "leitura",
        Write => "escrita",
        Security => "seguranca",
        Authentication => "autenticacao",
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AuditLog {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub user_name: String,
    pub action: String,
    pub resource: String,
    #[serde(default)]
    pub resource_id: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    pub status: AuditStatus,
    pub log_type: LogType,
    #[serde(default)]
    pub details: Option<String>,
}

impl AuditLog {
    /// Failed or blocked actions.
    pub fn is_problem(&self) -> bool {
        matches!(self.status, AuditStatus::Failed | AuditStatus::Blocked)
    }
}

impl Record for AuditLog {
    const TABLE: &'static str = "audit_logs";
}
