use std::sync::Arc;

use pondok_core::AppError;
use pondok_domain::{
    AuditAction, DepartmentScope, FilterOperator, GenderScope, QueryFilter, ResourceKind, Role,
};
use serde_json::{Value, json};

use crate::test_support::{
    FakeAuditRepository, FakeResourceRepository, audit_channel, identity, unrestricted,
};

use super::{ResourceListInput, ResourceService};

struct Harness {
    service: ResourceService,
    resources: Arc<FakeResourceRepository>,
    audit: Arc<FakeAuditRepository>,
    worker: crate::AuditWorker,
}

fn harness() -> Harness {
    let resources = Arc::new(FakeResourceRepository::default());
    let audit = Arc::new(FakeAuditRepository::default());
    let (recorder, worker) = audit_channel(audit.clone());

    Harness {
        service: ResourceService::new(resources.clone(), recorder),
        resources,
        audit,
        worker,
    }
}

impl Harness {
    async fn drain_audit(self) -> Arc<FakeAuditRepository> {
        let Self {
            service,
            audit,
            worker,
            ..
        } = self;
        drop(service);
        worker.run().await;
        audit
    }
}

async fn seed_students(resources: &FakeResourceRepository) -> (String, String, String) {
    let putra_kitab = resources
        .seed(
            ResourceKind::Santri,
            json!({"nama": "Ahmad", "jenis_kelamin": "L", "jurusan": "KITAB"}),
        )
        .await;
    let putra_tahfidz = resources
        .seed(
            ResourceKind::Santri,
            json!({"nama": "Hasan", "jenis_kelamin": "L", "jurusan": "TAHFIDZ"}),
        )
        .await;
    let putri_kitab = resources
        .seed(
            ResourceKind::Santri,
            json!({"nama": "Aisyah", "jenis_kelamin": "P", "jurusan": "KITAB"}),
        )
        .await;

    (putra_kitab, putra_tahfidz, putri_kitab)
}

async fn visible_count(
    service: &ResourceService,
    actor: &pondok_domain::ResolvedIdentity,
    resource: ResourceKind,
) -> pondok_core::AppResult<usize> {
    service
        .list_records(
            actor,
            resource,
            ResourceListInput {
                limit: 50,
                ..ResourceListInput::default()
            },
        )
        .await
        .map(|records| records.len())
}

fn names(records: &[pondok_domain::ResourceRecord]) -> Vec<&str> {
    records
        .iter()
        .filter_map(|record| record.text_field("nama"))
        .collect()
}

#[tokio::test]
async fn list_is_narrowed_to_the_caller_scope() {
    let harness = harness();
    seed_students(&harness.resources).await;
    let actor = identity(Role::Kesantrian, GenderScope::Male, DepartmentScope::All);

    let records = harness
        .service
        .list_records(
            &actor,
            ResourceKind::Santri,
            ResourceListInput {
                limit: 50,
                ..ResourceListInput::default()
            },
        )
        .await;

    let Ok(records) = records else {
        panic!("listing must succeed");
    };
    assert_eq!(names(&records), vec!["Ahmad", "Hasan"]);
}

#[tokio::test]
async fn caller_filters_cannot_widen_the_scope() {
    let harness = harness();
    seed_students(&harness.resources).await;
    let actor = identity(Role::Kesantrian, GenderScope::All, DepartmentScope::Kitab);
    let Ok(filter) = QueryFilter::new("jenis_kelamin", FilterOperator::Eq, json!("P")) else {
        panic!("filter must be valid");
    };

    let records = harness
        .service
        .list_records(
            &actor,
            ResourceKind::Santri,
            ResourceListInput {
                filters: vec![filter],
                limit: 50,
                ..ResourceListInput::default()
            },
        )
        .await;

    assert!(matches!(records, Ok(records) if names(&records) == vec!["Aisyah"]));
}

#[tokio::test]
async fn out_of_scope_record_reads_as_not_found() {
    let harness = harness();
    let (_, _, putri_kitab) = seed_students(&harness.resources).await;
    let actor = identity(Role::Kesantrian, GenderScope::Male, DepartmentScope::All);

    let result = harness
        .service
        .get_record(&actor, ResourceKind::Santri, putri_kitab.as_str())
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn unpartitioned_resources_ignore_scope() {
    let harness = harness();
    harness
        .resources
        .seed(ResourceKind::Berita, json!({"judul": "Haflah akhirussanah"}))
        .await;
    let actor = identity(Role::Dewan, GenderScope::Female, DepartmentScope::Tahfidz);

    let records = harness
        .service
        .list_records(&actor, ResourceKind::Berita, ResourceListInput::default())
        .await;

    assert!(matches!(records, Ok(records) if records.len() == 1));
}

#[tokio::test]
async fn create_outside_scope_is_forbidden() {
    let harness = harness();
    let actor = identity(Role::Kesantrian, GenderScope::Male, DepartmentScope::All);

    let result = harness
        .service
        .create_record(
            &actor,
            ResourceKind::Santri,
            json!({"nama": "Khadijah", "jenis_kelamin": "P", "jurusan": "KITAB"}),
        )
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
    assert!(harness.resources.records.lock().await.is_empty());
}

#[tokio::test]
async fn read_only_role_cannot_write() {
    let harness = harness();
    let actor = unrestricted(Role::Dewan);

    let result = harness
        .service
        .create_record(&actor, ResourceKind::Berita, json!({"judul": "Pengumuman"}))
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn treasurer_is_limited_to_finance_resources() {
    let harness = harness();
    let actor = unrestricted(Role::Bendahara);

    let denied = harness
        .service
        .create_record(&actor, ResourceKind::Inventaris, json!({"nama_barang": "Lemari"}))
        .await;
    let allowed = harness
        .service
        .create_record(
            &actor,
            ResourceKind::Pengeluaran,
            json!({"keterangan": "Listrik", "nominal": 1_500_000}),
        )
        .await;

    assert!(matches!(denied, Err(AppError::Forbidden(_))));
    assert!(allowed.is_ok());
}

#[tokio::test]
async fn non_object_payload_is_rejected() {
    let harness = harness();
    let actor = unrestricted(Role::SuperAdmin);

    let result = harness
        .service
        .create_record(&actor, ResourceKind::Berita, json!(["judul"]))
        .await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn student_owned_record_inherits_student_scope() {
    let harness = harness();
    let (putra_kitab, _, _) = seed_students(&harness.resources).await;
    let actor = identity(Role::Kesantrian, GenderScope::Male, DepartmentScope::Kitab);

    let result = harness
        .service
        .create_record(
            &actor,
            ResourceKind::Pelanggaran,
            json!({
                "santri_id": putra_kitab,
                "jenis": "terlambat",
                "jenis_kelamin": "P",
            }),
        )
        .await;

    let Ok(record) = result else {
        panic!("in-scope violation must be created");
    };
    assert_eq!(record.data()["jenis_kelamin"], json!("L"));
    assert_eq!(record.data()["jurusan"], json!("KITAB"));
}

#[tokio::test]
async fn moving_a_student_moves_their_owned_records() {
    let harness = harness();
    let (putra_kitab, _, _) = seed_students(&harness.resources).await;
    let admin = unrestricted(Role::SuperAdmin);
    let kitab_staff = identity(Role::Kesantrian, GenderScope::Male, DepartmentScope::Kitab);
    let tahfidz_staff = identity(Role::Kesantrian, GenderScope::Male, DepartmentScope::Tahfidz);

    let created = harness
        .service
        .create_record(
            &admin,
            ResourceKind::Nilai,
            json!({"santri_id": putra_kitab, "mapel": "Fiqih", "nilai": 85}),
        )
        .await;
    assert!(created.is_ok());

    let moved = harness
        .service
        .update_record(
            &admin,
            ResourceKind::Santri,
            putra_kitab.as_str(),
            json!({"nama": "Ahmad", "jenis_kelamin": "L", "jurusan": "TAHFIDZ"}),
        )
        .await;
    assert!(moved.is_ok());

    let for_tahfidz = visible_count(&harness.service, &tahfidz_staff, ResourceKind::Nilai).await;
    let for_kitab = visible_count(&harness.service, &kitab_staff, ResourceKind::Nilai).await;
    assert!(matches!(for_tahfidz, Ok(1)));
    assert!(matches!(for_kitab, Ok(0)));

    let student = harness
        .service
        .get_record(&kitab_staff, ResourceKind::Santri, putra_kitab.as_str())
        .await;
    assert!(matches!(student, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn department_scope_covers_every_operation_on_student_owned_records() {
    let harness = harness();
    let (_, putra_tahfidz, _) = seed_students(&harness.resources).await;
    let admin = unrestricted(Role::SuperAdmin);
    let kitab_staff = identity(Role::Kesantrian, GenderScope::Male, DepartmentScope::Kitab);

    let Ok(violation) = harness
        .service
        .create_record(
            &admin,
            ResourceKind::Pelanggaran,
            json!({"santri_id": putra_tahfidz, "jenis": "terlambat"}),
        )
        .await
    else {
        panic!("admin must record the violation");
    };
    assert_eq!(violation.data()["jurusan"], json!("TAHFIDZ"));
    let violation_id = violation.record_id();

    let created = harness
        .service
        .create_record(
            &kitab_staff,
            ResourceKind::Pelanggaran,
            json!({"santri_id": putra_tahfidz, "jenis": "bolos"}),
        )
        .await;
    let read = harness
        .service
        .get_record(&kitab_staff, ResourceKind::Pelanggaran, violation_id)
        .await;
    let listed = harness
        .service
        .list_records(
            &kitab_staff,
            ResourceKind::Pelanggaran,
            ResourceListInput {
                limit: 50,
                ..ResourceListInput::default()
            },
        )
        .await;
    let updated = harness
        .service
        .update_record(
            &kitab_staff,
            ResourceKind::Pelanggaran,
            violation_id,
            json!({"santri_id": putra_tahfidz, "jenis": "dihapus"}),
        )
        .await;
    let deleted = harness
        .service
        .delete_record(&kitab_staff, ResourceKind::Pelanggaran, violation_id)
        .await;

    assert!(matches!(created, Err(AppError::NotFound(_))));
    assert!(matches!(read, Err(AppError::NotFound(_))));
    assert!(matches!(listed, Ok(records) if records.is_empty()));
    assert!(matches!(updated, Err(AppError::NotFound(_))));
    assert!(matches!(deleted, Err(AppError::NotFound(_))));
    assert_eq!(harness.resources.records.lock().await.len(), 4);
}

#[tokio::test]
async fn student_owned_record_requires_visible_student() {
    let harness = harness();
    let (_, _, putri_kitab) = seed_students(&harness.resources).await;
    let actor = identity(Role::Kesantrian, GenderScope::Male, DepartmentScope::All);

    let missing_reference = harness
        .service
        .create_record(&actor, ResourceKind::Nilai, json!({"mapel": "Nahwu"}))
        .await;
    let hidden_student = harness
        .service
        .create_record(
            &actor,
            ResourceKind::Nilai,
            json!({"santri_id": putri_kitab, "mapel": "Nahwu", "nilai": 90}),
        )
        .await;

    assert!(matches!(missing_reference, Err(AppError::Validation(_))));
    assert!(matches!(hidden_student, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn create_records_one_audit_entry_with_actor_and_id() {
    let harness = harness();
    let actor = unrestricted(Role::Rois);

    let result = harness
        .service
        .create_record(&actor, ResourceKind::Berita, json!({"judul": "Libur"}))
        .await;
    let Ok(record) = result else {
        panic!("create must succeed");
    };

    let audit = harness.drain_audit().await;
    let events = audit.events.lock().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, AuditAction::Create);
    assert_eq!(events[0].resource_name, "berita");
    assert_eq!(events[0].record_id, record.record_id());
    assert_eq!(events[0].actor.id, actor.id().to_string());
    assert_eq!(events[0].details, json!({"judul": "Libur"}));
}

#[tokio::test]
async fn update_and_delete_record_previous_state() {
    let harness = harness();
    let (putra_kitab, _, _) = seed_students(&harness.resources).await;
    let actor = identity(Role::Kesantrian, GenderScope::Male, DepartmentScope::All);

    let updated = harness
        .service
        .update_record(
            &actor,
            ResourceKind::Santri,
            putra_kitab.as_str(),
            json!({"nama": "Ahmad Fauzi", "jenis_kelamin": "L", "jurusan": "KITAB"}),
        )
        .await;
    assert!(matches!(updated, Ok(record) if record.text_field("nama") == Some("Ahmad Fauzi")));

    let deleted = harness
        .service
        .delete_record(&actor, ResourceKind::Santri, putra_kitab.as_str())
        .await;
    assert!(deleted.is_ok());

    let audit = harness.drain_audit().await;
    let events = audit.events.lock().await;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].action, AuditAction::Update);
    assert_eq!(events[0].details["previous"]["nama"], json!("Ahmad"));
    assert_eq!(events[0].details["current"]["nama"], json!("Ahmad Fauzi"));
    assert_eq!(events[1].action, AuditAction::Delete);
    assert_eq!(events[1].record_id, putra_kitab);
    assert_eq!(events[1].details["nama"], json!("Ahmad Fauzi"));
}

#[tokio::test]
async fn update_cannot_move_record_out_of_scope() {
    let harness = harness();
    let (putra_kitab, _, _) = seed_students(&harness.resources).await;
    let actor = identity(Role::Kesantrian, GenderScope::Male, DepartmentScope::All);

    let result = harness
        .service
        .update_record(
            &actor,
            ResourceKind::Santri,
            putra_kitab.as_str(),
            json!({"nama": "Ahmad", "jenis_kelamin": "P"}),
        )
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn failed_write_is_not_audited() {
    let harness = harness();
    let (_, _, putri_kitab) = seed_students(&harness.resources).await;
    let actor = identity(Role::Kesantrian, GenderScope::Male, DepartmentScope::All);

    let result = harness
        .service
        .delete_record(&actor, ResourceKind::Santri, putri_kitab.as_str())
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let audit = harness.drain_audit().await;
    assert!(audit.events.lock().await.is_empty());
}

#[tokio::test]
async fn export_is_scoped_and_audited() {
    let harness = harness();
    seed_students(&harness.resources).await;
    let actor = identity(Role::Kesantrian, GenderScope::All, DepartmentScope::Kitab);

    let result = harness
        .service
        .export_records(&actor, ResourceKind::Santri, Vec::new())
        .await;
    assert!(matches!(result, Ok(records) if records.len() == 2));

    let audit = harness.drain_audit().await;
    let events = audit.events.lock().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, AuditAction::Export);
    assert_eq!(events[0].record_id, "-");
    assert_eq!(events[0].details, json!({"rows": 2, "filters": 0}));
}

#[tokio::test]
async fn summary_counts_only_visible_records() {
    let harness = harness();
    seed_students(&harness.resources).await;
    harness
        .resources
        .seed(ResourceKind::Tagihan, json!({"jenis_kelamin": "P", "nominal": 250_000}))
        .await;
    let actor = identity(Role::Bendahara, GenderScope::Male, DepartmentScope::All);

    let Ok(counts) = harness.service.summarize(&actor).await else {
        panic!("summary must succeed");
    };

    let total_for = |resource: ResourceKind| {
        counts
            .iter()
            .find(|count| count.resource == resource)
            .map(|count| count.total)
    };
    assert_eq!(counts.len(), ResourceKind::all().len());
    assert_eq!(total_for(ResourceKind::Santri), Some(2));
    assert_eq!(total_for(ResourceKind::Tagihan), Some(0));
    assert_eq!(total_for(ResourceKind::Berita), Some(0));
}

#[tokio::test]
async fn reserved_fields_are_not_persisted() {
    let harness = harness();
    let actor = unrestricted(Role::SuperAdmin);

    let result = harness
        .service
        .create_record(
            &actor,
            ResourceKind::Inventaris,
            json!({"id": "forged", "created_at": "1999", "nama_barang": "Kipas"}),
        )
        .await;

    let Ok(record) = result else {
        panic!("create must succeed");
    };
    assert_eq!(record.data().get("id"), None::<&Value>);
    assert_eq!(record.data().get("created_at"), None::<&Value>);
}
