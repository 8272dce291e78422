use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use pondok_application::{
    AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository, AuditRepository,
};
use pondok_core::AppResult;

/// In-memory audit store serving both the append and the read port.
#[derive(Debug, Default)]
pub struct InMemoryAuditRepository {
    entries: RwLock<Vec<AuditLogEntry>>,
}

impl InMemoryAuditRepository {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditRepository for InMemoryAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.entries.write().await.push(AuditLogEntry {
            event_id: Uuid::new_v4().to_string(),
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            actor_id: event.actor.id,
            actor_name: event.actor.name,
            actor_role: event.actor.role,
            action: event.action.as_str().to_owned(),
            resource_name: event.resource_name,
            record_id: event.record_id,
            details: event.details,
        });
        Ok(())
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryAuditRepository {
    async fn list_recent_entries(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .rev()
            .filter(|entry| {
                query
                    .action
                    .is_none_or(|action| entry.action == action.as_str())
                    && query
                        .actor_id
                        .as_deref()
                        .is_none_or(|actor_id| entry.actor_id == actor_id)
            })
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect())
    }
}
