use std::sync::Arc;

use async_trait::async_trait;
use pondok_core::{AppError, AppResult};
use pondok_domain::{AuditAction, AuditActor, ResolvedIdentity};
use serde_json::Value;

mod recorder;

#[cfg(test)]
mod tests;

pub use recorder::{AuditDeliveryPolicy, AuditRecorder, AuditWorker};

/// Immutable audit record emitted by application use-cases.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEvent {
    /// Narrowed view of the acting identity.
    pub actor: AuditActor,
    /// Stable audit action.
    pub action: AuditAction,
    /// Resource name, for example `santri`.
    pub resource_name: String,
    /// Record id or `-` when none was supplied.
    pub record_id: String,
    /// Sanitized detail payload.
    pub details: Value,
}

/// Port for persisting append-only audit records.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Persists one audit record.
    async fn append_event(&self, event: AuditEvent) -> AppResult<()>;
}

/// Audit log entry projection for administrative views.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditLogEntry {
    /// Stable event identifier.
    pub event_id: String,
    /// Event timestamp in RFC3339.
    pub created_at: String,
    /// Actor account id.
    pub actor_id: String,
    /// Actor display name at the time of the event.
    pub actor_name: String,
    /// Actor role at the time of the event.
    pub actor_role: String,
    /// Stable action identifier.
    pub action: String,
    /// Resource name.
    pub resource_name: String,
    /// Record id or `-`.
    pub record_id: String,
    /// Detail payload.
    pub details: Value,
}

/// Query parameters for audit log listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditLogQuery {
    /// Maximum rows returned.
    pub limit: usize,
    /// Number of rows skipped for offset pagination.
    pub offset: usize,
    /// Optional action filter.
    pub action: Option<AuditAction>,
    /// Optional actor filter.
    pub actor_id: Option<String>,
}

/// Repository port for reading the audit log newest first.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    /// Lists most recent audit entries.
    async fn list_recent_entries(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>>;
}

/// Application service for audit log views.
#[derive(Clone)]
pub struct AuditLogService {
    repository: Arc<dyn AuditLogRepository>,
}

impl AuditLogService {
    /// Creates a service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn AuditLogRepository>) -> Self {
        Self { repository }
    }

    /// Lists audit entries for roles allowed to review them.
    pub async fn list_audit_log(
        &self,
        actor: &ResolvedIdentity,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditLogEntry>> {
        if !actor.role().can_read_audit_log() {
            return Err(AppError::Forbidden(format!(
                "role '{}' may not read the audit log",
                actor.role()
            )));
        }

        self.repository.list_recent_entries(query).await
    }
}
