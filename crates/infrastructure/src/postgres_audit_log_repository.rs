use async_trait::async_trait;
use serde_json::Value;
use sqlx::{FromRow, PgPool};

use pondok_application::{AuditLogEntry, AuditLogQuery, AuditLogRepository};
use pondok_core::{AppError, AppResult};
use pondok_domain::MAX_PAGE_SIZE;


/// PostgreSQL-backed repository for audit log read models.
#[derive(Clone)]
pub struct PostgresAuditLogRepository {
    pool: PgPool,
}

impl PostgresAuditLogRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct AuditLogRow {
    event_id: uuid::Uuid,
    actor_id: String,
    actor_name: String,
    actor_role: String,
    action: String,
    resource_name: String,
    record_id: String,
    details: Value,
    created_at: String,
}

#[async_trait]
impl AuditLogRepository for PostgresAuditLogRepository {
    async fn list_recent_entries(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>> {
        let capped_limit = i64::try_from(query.limit.clamp(1, MAX_PAGE_SIZE)).unwrap_or(50);
        let capped_offset = i64::try_from(query.offset.min(10_000)).unwrap_or(0);
        let rows = sqlx::query_as::<_, AuditLogRow>(
            r#"
            SELECT
                id AS event_id,
                actor_id,
                actor_name,
                actor_role,
                action,
                resource_name,
                record_id,
                details,
                to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD"T"HH24:MI:SS"Z"') AS created_at
            FROM audit_records
            WHERE ($1::TEXT IS NULL OR action = $1)
                AND ($2::TEXT IS NULL OR actor_id = $2)
            ORDER BY audit_records.created_at DESC
            LIMIT $3
            OFFSET $4
            "#,
        )
        .bind(query.action.map(|action| action.as_str()))
        .bind(query.actor_id)
        .bind(capped_limit)
        .bind(capped_offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list audit records: {error}")))?;

        Ok(rows
            .into_iter()
            .map(|row| AuditLogEntry {
                event_id: row.event_id.to_string(),
                created_at: row.created_at,
                actor_id: row.actor_id,
                actor_name: row.actor_name,
                actor_role: row.actor_role,
                action: row.action,
                resource_name: row.resource_name,
                record_id: row.record_id,
                details: row.details,
            })
            .collect())
    }
}
