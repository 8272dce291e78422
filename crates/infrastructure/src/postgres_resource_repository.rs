use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use pondok_application::ResourceRepository;
use pondok_core::{AppError, AppResult};
use pondok_domain::{
    ResourceKind, ResourceRecord, STUDENT_RELATION_FIELD, STUDENT_SCOPE_FIELDS, ScopedQuery,
};

mod query;


use query::{push_predicates, push_sort};

const RECORD_COLUMNS: &str = "id, resource_name, data, \
     to_char(created_at AT TIME ZONE 'UTC', 'YYYY-MM-DD\"T\"HH24:MI:SS\"Z\"') AS created_at";

/// PostgreSQL-backed repository storing every resource as JSONB documents.
#[derive(Clone)]
pub struct PostgresResourceRepository {
    pool: PgPool,
}

impl PostgresResourceRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ResourceRecordRow {
    id: Uuid,
    resource_name: String,
    data: Value,
    created_at: String,
}

fn record_from_row(row: ResourceRecordRow) -> AppResult<ResourceRecord> {
    let resource = row.resource_name.parse::<ResourceKind>().map_err(|_| {
        AppError::Internal(format!(
            "stored record '{}' has unknown resource '{}'",
            row.id, row.resource_name
        ))
    })?;

    Ok(ResourceRecord::new(
        row.id.to_string(),
        resource,
        row.data,
        row.created_at,
    ))
}

fn scoped_target<'args>(
    builder: &mut QueryBuilder<'args, Postgres>,
    query: &'args ScopedQuery,
    record_id: Uuid,
) {
    builder.push(" WHERE id = ");
    builder.push_bind(record_id);
    builder.push(" AND resource_name = ");
    builder.push_bind(query.resource().as_str());
    push_predicates(builder, query.scope_filters().iter());
}

#[async_trait]
impl ResourceRepository for PostgresResourceRepository {
    async fn list_records(&self, query: &ScopedQuery) -> AppResult<Vec<ResourceRecord>> {
        let limit = i64::try_from(query.limit()).map_err(|error| {
            AppError::Validation(format!("invalid resource query limit: {error}"))
        })?;
        let offset = i64::try_from(query.offset()).map_err(|error| {
            AppError::Validation(format!("invalid resource query offset: {error}"))
        })?;

        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new("SELECT ");
        builder.push(RECORD_COLUMNS);
        builder.push(" FROM resource_records WHERE resource_name = ");
        builder.push_bind(query.resource().as_str());
        push_predicates(&mut builder, query.predicates());
        push_sort(&mut builder, query.sort());
        builder.push(" LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        let rows = builder
            .build_query_as::<ResourceRecordRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to list records for '{}': {error}",
                    query.resource()
                ))
            })?;

        rows.into_iter().map(record_from_row).collect()
    }

    async fn count_records(&self, query: &ScopedQuery) -> AppResult<u64> {
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM resource_records WHERE resource_name = ");
        builder.push_bind(query.resource().as_str());
        push_predicates(&mut builder, query.predicates());

        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to count records for '{}': {error}",
                    query.resource()
                ))
            })?;

        Ok(u64::try_from(count).unwrap_or_default())
    }

    async fn find_record(
        &self,
        query: &ScopedQuery,
        record_id: &str,
    ) -> AppResult<Option<ResourceRecord>> {
        let Ok(record_uuid) = Uuid::parse_str(record_id) else {
            return Ok(None);
        };

        let mut builder: QueryBuilder<'_, Postgres> = QueryBuilder::new("SELECT ");
        builder.push(RECORD_COLUMNS);
        builder.push(" FROM resource_records");
        scoped_target(&mut builder, query, record_uuid);

        let row = builder
            .build_query_as::<ResourceRecordRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to find record '{record_id}' in '{}': {error}",
                    query.resource()
                ))
            })?;

        row.map(record_from_row).transpose()
    }

    async fn insert_record(&self, resource: ResourceKind, data: Value) -> AppResult<ResourceRecord> {
        let row = sqlx::query_as::<_, ResourceRecordRow>(&format!(
            "INSERT INTO resource_records (resource_name, data) VALUES ($1, $2) RETURNING {RECORD_COLUMNS}"
        ))
        .bind(resource.as_str())
        .bind(&data)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to insert record into '{resource}': {error}"))
        })?;

        record_from_row(row)
    }

    async fn update_record(
        &self,
        query: &ScopedQuery,
        record_id: &str,
        data: Value,
    ) -> AppResult<ResourceRecord> {
        let record_uuid = parse_record_uuid(query.resource(), record_id)?;

        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("UPDATE resource_records SET data = ");
        builder.push_bind(data);
        builder.push(", updated_at = now()");
        scoped_target(&mut builder, query, record_uuid);
        builder.push(" RETURNING ");
        builder.push(RECORD_COLUMNS);

        let row = builder
            .build_query_as::<ResourceRecordRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to update record '{record_id}' in '{}': {error}",
                    query.resource()
                ))
            })?
            .ok_or_else(|| record_not_found(query.resource(), record_id))?;

        record_from_row(row)
    }

    async fn delete_record(&self, query: &ScopedQuery, record_id: &str) -> AppResult<()> {
        let record_uuid = parse_record_uuid(query.resource(), record_id)?;

        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("DELETE FROM resource_records");
        scoped_target(&mut builder, query, record_uuid);

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to delete record '{record_id}' in '{}': {error}",
                    query.resource()
                ))
            })?;

        if result.rows_affected() == 0 {
            return Err(record_not_found(query.resource(), record_id));
        }

        Ok(())
    }

    async fn reassign_student_scope(
        &self,
        student_id: &str,
        scope: &Map<String, Value>,
    ) -> AppResult<u64> {
        let resources: Vec<&str> = ResourceKind::student_owned()
            .iter()
            .map(ResourceKind::as_str)
            .collect();

        let result = sqlx::query(
            "UPDATE resource_records \
             SET data = (data - $1::TEXT[]) || $2::JSONB, updated_at = now() \
             WHERE resource_name = ANY($3) AND data ->> $4 = $5",
        )
        .bind(STUDENT_SCOPE_FIELDS.as_slice())
        .bind(Value::Object(scope.clone()))
        .bind(resources.as_slice())
        .bind(STUDENT_RELATION_FIELD)
        .bind(student_id)
        .execute(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to reassign scope of records owned by student '{student_id}': {error}"
            ))
        })?;

        Ok(result.rows_affected())
    }
}

fn parse_record_uuid(resource: ResourceKind, record_id: &str) -> AppResult<Uuid> {
    Uuid::parse_str(record_id).map_err(|_| record_not_found(resource, record_id))
}

fn record_not_found(resource: ResourceKind, record_id: &str) -> AppError {
    AppError::NotFound(format!(
        "record '{record_id}' does not exist in '{resource}'"
    ))
}
