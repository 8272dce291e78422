use pondok_core::{AppError, AppResult};
use pondok_domain::{
    AuditAction, ResolvedIdentity, ResourceKind, ResourceRecord, STUDENT_RELATION_FIELD,
    STUDENT_SCOPE_FIELDS, ScopedQuery, student_scope,
};
use serde_json::{Map, Value, json};
use tracing::info;

use super::{ResourceService, record_not_found};

const RESERVED_FIELDS: &[&str] = &["id", "created_at"];

impl ResourceService {
    /// Creates a record inside the actor's scope and records the creation.
    pub async fn create_record(
        &self,
        actor: &ResolvedIdentity,
        resource: ResourceKind,
        data: Value,
    ) -> AppResult<ResourceRecord> {
        require_write_access(actor, resource)?;
        let data = self.prepare_payload(actor, resource, data).await?;

        let record = self.repository.insert_record(resource, data).await?;

        self.audit.record(
            Some(actor),
            AuditAction::Create,
            resource.as_str(),
            Some(record.record_id()),
            Some(record.data().clone()),
        );

        Ok(record)
    }

    /// Replaces a record visible to the actor and records the change.
    pub async fn update_record(
        &self,
        actor: &ResolvedIdentity,
        resource: ResourceKind,
        record_id: &str,
        data: Value,
    ) -> AppResult<ResourceRecord> {
        require_write_access(actor, resource)?;
        let query = ScopedQuery::new(actor, resource);
        let previous = self
            .repository
            .find_record(&query, record_id)
            .await?
            .ok_or_else(|| record_not_found(resource, record_id))?;
        let data = self.prepare_payload(actor, resource, data).await?;

        let record = self.repository.update_record(&query, record_id, data).await?;

        if resource == ResourceKind::Santri {
            let scope = student_scope(record.data());
            if scope != student_scope(previous.data()) {
                let reassigned = self
                    .repository
                    .reassign_student_scope(record.record_id(), &scope)
                    .await?;
                info!(
                    student_id = record.record_id(),
                    reassigned, "student scope moved to owned records"
                );
            }
        }

        self.audit.record(
            Some(actor),
            AuditAction::Update,
            resource.as_str(),
            Some(record.record_id()),
            Some(json!({
                "previous": previous.data(),
                "current": record.data(),
            })),
        );

        Ok(record)
    }

    /// Deletes a record visible to the actor and records the deletion.
    pub async fn delete_record(
        &self,
        actor: &ResolvedIdentity,
        resource: ResourceKind,
        record_id: &str,
    ) -> AppResult<()> {
        require_write_access(actor, resource)?;
        let query = ScopedQuery::new(actor, resource);
        let previous = self
            .repository
            .find_record(&query, record_id)
            .await?
            .ok_or_else(|| record_not_found(resource, record_id))?;

        self.repository.delete_record(&query, record_id).await?;

        self.audit.record(
            Some(actor),
            AuditAction::Delete,
            resource.as_str(),
            Some(record_id),
            Some(previous.data().clone()),
        );

        Ok(())
    }

    async fn prepare_payload(
        &self,
        actor: &ResolvedIdentity,
        resource: ResourceKind,
        data: Value,
    ) -> AppResult<Value> {
        let Value::Object(mut payload) = data else {
            return Err(AppError::Validation(format!(
                "payload for '{resource}' must be a JSON object"
            )));
        };
        for field in RESERVED_FIELDS {
            payload.remove(*field);
        }

        if resource.is_student_owned() {
            self.inherit_student_scope(actor, resource, &mut payload)
                .await?;
        }

        let payload = Value::Object(payload);
        if !ScopedQuery::new(actor, resource).scope_admits(&payload) {
            return Err(AppError::Forbidden(format!(
                "record for '{resource}' lies outside the caller's access scope"
            )));
        }

        Ok(payload)
    }

    async fn inherit_student_scope(
        &self,
        actor: &ResolvedIdentity,
        resource: ResourceKind,
        payload: &mut Map<String, Value>,
    ) -> AppResult<()> {
        let student_id = payload
            .get(STUDENT_RELATION_FIELD)
            .and_then(Value::as_str)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "'{resource}' records require '{STUDENT_RELATION_FIELD}'"
                ))
            })?
            .to_owned();

        let student = self
            .get_record(actor, ResourceKind::Santri, student_id.as_str())
            .await?;

        for field in STUDENT_SCOPE_FIELDS {
            payload.remove(field);
        }
        payload.extend(student_scope(student.data()));

        Ok(())
    }
}

fn require_write_access(actor: &ResolvedIdentity, resource: ResourceKind) -> AppResult<()> {
    if !actor.is_active() {
        return Err(AppError::Forbidden("account is deactivated".to_owned()));
    }

    if !resource.writable_by(actor.role()) {
        return Err(AppError::Forbidden(format!(
            "role '{}' may not modify '{resource}'",
            actor.role()
        )));
    }

    Ok(())
}
