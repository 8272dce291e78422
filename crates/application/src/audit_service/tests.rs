use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pondok_core::AppResult;
use pondok_domain::{
    AuditAction, DETAIL_PLACEHOLDER_MESSAGE, DepartmentScope, GenderScope, Role,
};
use serde_json::json;

use crate::test_support::{FakeAuditRepository, audit_channel, identity, unrestricted};

use super::{
    AuditDeliveryPolicy, AuditLogEntry, AuditLogQuery, AuditLogRepository, AuditLogService,
    AuditRecorder,
};

#[tokio::test]
async fn record_without_actor_writes_nothing() {
    let repository = Arc::new(FakeAuditRepository::default());
    let (recorder, worker) = audit_channel(repository.clone());

    recorder.record(
        None,
        AuditAction::Create,
        "santri",
        Some("santri-1"),
        Some(json!({"nama": "Ahmad"})),
    );
    drop(recorder);
    worker.run().await;

    assert!(repository.events.lock().await.is_empty());
    assert_eq!(*repository.attempts.lock().await, 0);
}

#[tokio::test]
async fn record_without_id_stores_dash_and_narrowed_actor() {
    let repository = Arc::new(FakeAuditRepository::default());
    let (recorder, worker) = audit_channel(repository.clone());
    let actor = identity(Role::Kesantrian, GenderScope::Male, DepartmentScope::All);

    recorder.record(
        Some(&actor),
        AuditAction::Create,
        "pelanggaran",
        None,
        Some(json!({"jenis": "terlambat", "__reactProps": {"onClick": null}})),
    );
    drop(recorder);
    worker.run().await;

    let events = repository.events.lock().await;
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.action, AuditAction::Create);
    assert_eq!(event.record_id, "-");
    assert_eq!(event.actor.id, actor.id().to_string());
    assert_eq!(event.actor.name, actor.name());
    assert_eq!(event.actor.role, "kesantrian");
    assert_eq!(event.details, json!({"jenis": "terlambat"}));
}

#[tokio::test]
async fn blank_record_id_is_treated_as_missing() {
    let repository = Arc::new(FakeAuditRepository::default());
    let (recorder, worker) = audit_channel(repository.clone());
    let actor = unrestricted(Role::SuperAdmin);

    recorder.record(Some(&actor), AuditAction::Export, "tagihan", Some("  "), None);
    drop(recorder);
    worker.run().await;

    let events = repository.events.lock().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].record_id, "-");
    assert_eq!(events[0].details, json!({}));
}

#[tokio::test]
async fn element_laden_details_are_stripped_or_replaced() {
    let repository = Arc::new(FakeAuditRepository::default());
    let (recorder, worker) = audit_channel(repository.clone());
    let actor = unrestricted(Role::Rois);

    recorder.record(
        Some(&actor),
        AuditAction::Update,
        "santri",
        Some("santri-1"),
        Some(json!({"event": {"nodeType": 1, "nodeName": "INPUT"}, "kelas": "8B"})),
    );
    recorder.record(
        Some(&actor),
        AuditAction::Update,
        "santri",
        Some("santri-2"),
        Some(json!({"$$typeof": "react.element", "props": {}})),
    );
    drop(recorder);
    worker.run().await;

    let events = repository.events.lock().await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].details, json!({"kelas": "8B"}));
    assert_eq!(
        events[1].details,
        json!({"error": DETAIL_PLACEHOLDER_MESSAGE})
    );
}

#[tokio::test]
async fn transient_store_failures_are_retried() {
    let repository = Arc::new(FakeAuditRepository::failing(2));
    let (recorder, worker) = audit_channel(repository.clone());
    let actor = unrestricted(Role::Bendahara);

    recorder.record(Some(&actor), AuditAction::Delete, "tagihan", Some("t-1"), None);
    drop(recorder);
    worker.run().await;

    assert_eq!(*repository.attempts.lock().await, 3);
    assert_eq!(repository.events.lock().await.len(), 1);
}

#[tokio::test]
async fn persistent_store_failure_is_swallowed() {
    let repository = Arc::new(FakeAuditRepository::failing(10));
    let (recorder, worker) = audit_channel(repository.clone());
    let actor = unrestricted(Role::Bendahara);

    recorder.record(Some(&actor), AuditAction::Delete, "tagihan", Some("t-1"), None);
    recorder.record(Some(&actor), AuditAction::Delete, "tagihan", Some("t-2"), None);
    drop(recorder);
    worker.run().await;

    assert_eq!(*repository.attempts.lock().await, 6);
    assert!(repository.events.lock().await.is_empty());
}

#[tokio::test]
async fn full_queue_drops_records_without_blocking() {
    let repository = Arc::new(FakeAuditRepository::default());
    let (recorder, worker) = AuditRecorder::channel(
        repository.clone(),
        AuditDeliveryPolicy {
            queue_capacity: 1,
            max_attempts: 1,
            retry_base_delay: Duration::ZERO,
        },
    );
    let actor = unrestricted(Role::SuperAdmin);

    recorder.record(Some(&actor), AuditAction::Login, "auth", None, None);
    recorder.record(Some(&actor), AuditAction::Login, "auth", None, None);
    drop(recorder);
    worker.run().await;

    assert_eq!(repository.events.lock().await.len(), 1);
}

#[tokio::test]
async fn record_after_worker_stopped_does_not_panic() {
    let repository = Arc::new(FakeAuditRepository::default());
    let (recorder, worker) = audit_channel(repository.clone());
    drop(worker);

    let actor = unrestricted(Role::SuperAdmin);
    recorder.record(Some(&actor), AuditAction::Login, "auth", None, None);

    assert!(repository.events.lock().await.is_empty());
}

struct StaticAuditLogRepository;

#[async_trait]
impl AuditLogRepository for StaticAuditLogRepository {
    async fn list_recent_entries(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>> {
        Ok(vec![AuditLogEntry {
            event_id: "evt-1".to_owned(),
            created_at: "2026-01-01T00:00:00Z".to_owned(),
            actor_id: query.actor_id.unwrap_or_default(),
            actor_name: "Ustadz".to_owned(),
            actor_role: "rois".to_owned(),
            action: "CREATE".to_owned(),
            resource_name: "santri".to_owned(),
            record_id: "-".to_owned(),
            details: json!({}),
        }])
    }
}

fn audit_query() -> AuditLogQuery {
    AuditLogQuery {
        limit: 50,
        offset: 0,
        action: None,
        actor_id: None,
    }
}

#[tokio::test]
async fn audit_log_is_visible_to_leadership_only() {
    let service = AuditLogService::new(Arc::new(StaticAuditLogRepository));

    for role in [Role::SuperAdmin, Role::Rois] {
        let result = service.list_audit_log(&unrestricted(role), audit_query()).await;
        assert!(matches!(result, Ok(entries) if entries.len() == 1));
    }

    for role in [Role::Bendahara, Role::Kesantrian, Role::Dewan] {
        let result = service.list_audit_log(&unrestricted(role), audit_query()).await;
        assert!(result.is_err());
    }
}
