use std::sync::Arc;

use async_trait::async_trait;
use pondok_core::{AppError, AppResult};
use pondok_domain::{
    AuditAction, QueryFilter, ResolvedIdentity, ResourceKind, ResourceRecord, ResourceSort,
    ScopedQuery,
};
use serde_json::{Map, Value, json};

use crate::AuditRecorder;

mod writes;

#[cfg(test)]
mod tests;

/// Repository port for domain resource records.
///
/// Reads and record-targeted writes take a [`ScopedQuery`]; implementations
/// must apply every predicate it carries.
#[async_trait]
pub trait ResourceRepository: Send + Sync {
    /// Lists records matching the query, newest first unless sorted.
    async fn list_records(&self, query: &ScopedQuery) -> AppResult<Vec<ResourceRecord>>;

    /// Counts records matching the query, ignoring paging.
    async fn count_records(&self, query: &ScopedQuery) -> AppResult<u64>;

    /// Finds one record inside the query's scope.
    async fn find_record(
        &self,
        query: &ScopedQuery,
        record_id: &str,
    ) -> AppResult<Option<ResourceRecord>>;

    /// Inserts a new record.
    async fn insert_record(&self, resource: ResourceKind, data: Value) -> AppResult<ResourceRecord>;

    /// Replaces the payload of a record inside the query's scope.
    async fn update_record(
        &self,
        query: &ScopedQuery,
        record_id: &str,
        data: Value,
    ) -> AppResult<ResourceRecord>;

    /// Deletes a record inside the query's scope.
    async fn delete_record(&self, query: &ScopedQuery, record_id: &str) -> AppResult<()>;

    /// Replaces the student scope fields on every student-owned record that
    /// references `student_id`, returning the number of records rewritten.
    ///
    /// Fields absent from `scope` are removed. The caller's scope is not
    /// applied: the student update that triggers this was already checked.
    async fn reassign_student_scope(
        &self,
        student_id: &str,
        scope: &Map<String, Value>,
    ) -> AppResult<u64>;
}

/// Caller-controlled part of a list query.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResourceListInput {
    /// Additional filters ANDed after the scope filters.
    pub filters: Vec<QueryFilter>,
    /// Optional sort clause.
    pub sort: Option<ResourceSort>,
    /// Page size.
    pub limit: usize,
    /// Page offset.
    pub offset: usize,
}

/// Record count for one resource within the caller's scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceCount {
    /// Counted resource.
    pub resource: ResourceKind,
    /// Number of visible records.
    pub total: u64,
}

/// Application service for scoped resource access.
#[derive(Clone)]
pub struct ResourceService {
    repository: Arc<dyn ResourceRepository>,
    audit: AuditRecorder,
}

impl ResourceService {
    /// Creates a service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn ResourceRepository>, audit: AuditRecorder) -> Self {
        Self { repository, audit }
    }

    /// Lists records visible to the actor.
    pub async fn list_records(
        &self,
        actor: &ResolvedIdentity,
        resource: ResourceKind,
        input: ResourceListInput,
    ) -> AppResult<Vec<ResourceRecord>> {
        let query = ScopedQuery::new(actor, resource)
            .with_filters(input.filters)
            .with_sort(input.sort)
            .with_page(input.limit, input.offset);

        self.repository.list_records(&query).await
    }

    /// Returns one record visible to the actor.
    pub async fn get_record(
        &self,
        actor: &ResolvedIdentity,
        resource: ResourceKind,
        record_id: &str,
    ) -> AppResult<ResourceRecord> {
        let query = ScopedQuery::new(actor, resource);
        self.repository
            .find_record(&query, record_id)
            .await?
            .ok_or_else(|| record_not_found(resource, record_id))
    }

    /// Exports records visible to the actor and records the export.
    pub async fn export_records(
        &self,
        actor: &ResolvedIdentity,
        resource: ResourceKind,
        filters: Vec<QueryFilter>,
    ) -> AppResult<Vec<ResourceRecord>> {
        let filter_count = filters.len();
        let query = ScopedQuery::new(actor, resource)
            .with_filters(filters)
            .for_export();
        let records = self.repository.list_records(&query).await?;

        self.audit.record(
            Some(actor),
            AuditAction::Export,
            resource.as_str(),
            None,
            Some(json!({
                "rows": records.len(),
                "filters": filter_count,
            })),
        );

        Ok(records)
    }

    /// Counts visible records for every resource.
    pub async fn summarize(&self, actor: &ResolvedIdentity) -> AppResult<Vec<ResourceCount>> {
        let mut counts = Vec::with_capacity(ResourceKind::all().len());

        for resource in ResourceKind::all() {
            let query = ScopedQuery::new(actor, *resource);
            counts.push(ResourceCount {
                resource: *resource,
                total: self.repository.count_records(&query).await?,
            });
        }

        Ok(counts)
    }
}

fn record_not_found(resource: ResourceKind, record_id: &str) -> AppError {
    AppError::NotFound(format!(
        "record '{record_id}' does not exist in '{resource}'"
    ))
}
