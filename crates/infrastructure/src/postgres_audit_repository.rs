use async_trait::async_trait;
use sqlx::PgPool;

use pondok_application::{AuditEvent, AuditRepository};
use pondok_core::{AppError, AppResult};

/// PostgreSQL-backed append-only audit repository.
#[derive(Clone)]
pub struct PostgresAuditRepository {
    pool: PgPool,
}

impl PostgresAuditRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for PostgresAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_records (
                actor_id,
                actor_name,
                actor_role,
                action,
                resource_name,
                record_id,
                details
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(event.actor.id)
        .bind(event.actor.name)
        .bind(event.actor.role)
        .bind(event.action.as_str())
        .bind(event.resource_name)
        .bind(event.record_id)
        .bind(event.details)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append audit record: {error}")))?;

        Ok(())
    }
}
