use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use pondok_application::ResourceRepository;
use pondok_core::{AppError, AppResult};
use pondok_domain::{
    ResourceKind, ResourceRecord, STUDENT_RELATION_FIELD, STUDENT_SCOPE_FIELDS, ScopedQuery,
    SortDirection,
};

/// In-memory resource repository used for local runs and tests.
#[derive(Debug, Default)]
pub struct InMemoryResourceRepository {
    records: RwLock<Vec<ResourceRecord>>,
}

impl InMemoryResourceRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn in_target(record: &ResourceRecord, query: &ScopedQuery, record_id: &str) -> bool {
    record.resource() == query.resource()
        && record.record_id() == record_id
        && query.scope_admits(record.data())
}

fn compare_field(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left, right) {
        (Some(Value::Number(left)), Some(Value::Number(right))) => left
            .as_f64()
            .partial_cmp(&right.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(left)), Some(Value::String(right))) => left.cmp(right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl ResourceRepository for InMemoryResourceRepository {
    async fn list_records(&self, query: &ScopedQuery) -> AppResult<Vec<ResourceRecord>> {
        let records = self.records.read().await;
        let mut matching: Vec<ResourceRecord> = records
            .iter()
            .rev()
            .filter(|record| record.resource() == query.resource() && query.matches(record.data()))
            .cloned()
            .collect();

        if let Some(sort) = query.sort() {
            matching.sort_by(|left, right| {
                let ordering =
                    compare_field(left.data().get(sort.field()), right.data().get(sort.field()));
                match sort.direction() {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        Ok(matching
            .into_iter()
            .skip(query.offset())
            .take(query.limit())
            .collect())
    }

    async fn count_records(&self, query: &ScopedQuery) -> AppResult<u64> {
        let records = self.records.read().await;
        let count = records
            .iter()
            .filter(|record| record.resource() == query.resource() && query.matches(record.data()))
            .count();

        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn find_record(
        &self,
        query: &ScopedQuery,
        record_id: &str,
    ) -> AppResult<Option<ResourceRecord>> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|record| in_target(record, query, record_id))
            .cloned())
    }

    async fn insert_record(&self, resource: ResourceKind, data: Value) -> AppResult<ResourceRecord> {
        let record = ResourceRecord::new(
            Uuid::new_v4().to_string(),
            resource,
            data,
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        );
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn update_record(
        &self,
        query: &ScopedQuery,
        record_id: &str,
        data: Value,
    ) -> AppResult<ResourceRecord> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|record| in_target(record, query, record_id))
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "record '{record_id}' does not exist in '{}'",
                    query.resource()
                ))
            })?;

        *record = ResourceRecord::new(
            record.record_id(),
            record.resource(),
            data,
            record.created_at(),
        );
        Ok(record.clone())
    }

    async fn delete_record(&self, query: &ScopedQuery, record_id: &str) -> AppResult<()> {
        let mut records = self.records.write().await;
        let position = records
            .iter()
            .position(|record| in_target(record, query, record_id))
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "record '{record_id}' does not exist in '{}'",
                    query.resource()
                ))
            })?;

        records.remove(position);
        Ok(())
    }

    async fn reassign_student_scope(
        &self,
        student_id: &str,
        scope: &Map<String, Value>,
    ) -> AppResult<u64> {
        let mut records = self.records.write().await;
        let mut reassigned = 0_u64;

        for record in records.iter_mut() {
            if !record.resource().is_student_owned()
                || record.text_field(STUDENT_RELATION_FIELD) != Some(student_id)
            {
                continue;
            }

            let Value::Object(mut fields) = record.data().clone() else {
                continue;
            };
            for field in STUDENT_SCOPE_FIELDS {
                fields.remove(field);
            }
            fields.extend(scope.clone());

            *record = ResourceRecord::new(
                record.record_id(),
                record.resource(),
                Value::Object(fields),
                record.created_at(),
            );
            reassigned += 1;
        }

        Ok(reassigned)
    }
}
