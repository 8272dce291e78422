use std::sync::Arc;
use std::time::Duration;

use pondok_application::{
    AccessProfileService, AuditDeliveryPolicy, AuditLogService, AuditRecorder, AuditWorker,
    AuthService, IdentityResolver, MissingProfilePolicy, PrivilegedFunctionService,
    ResourceRepository, ResourceService,
};
use pondok_core::AccountId;
use pondok_domain::{
    AccessScope, DepartmentScope, GenderScope, ResolvedIdentity, ResourceKind, Role,
};
use pondok_infrastructure::{
    HttpAuthProvider, HttpFunctionGateway, InMemoryAccessProfileRepository,
    InMemoryAuditRepository, InMemoryResourceRepository,
};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;

use crate::state::AppState;

const UNREACHABLE_BACKEND: &str = "http://127.0.0.1:9/";

pub struct TestState {
    pub state: AppState,
    pub resources: Arc<InMemoryResourceRepository>,
    pub audit: Arc<InMemoryAuditRepository>,
    pub worker: AuditWorker,
}

impl TestState {
    pub async fn seed(&self, resource: ResourceKind, data: Value) -> String {
        let Ok(record) = self.resources.insert_record(resource, data).await else {
            panic!("seeding must succeed");
        };
        record.record_id().to_owned()
    }
}

/// Builds application state over in-memory stores.
///
/// The auth and function backends point at a closed port; tests that reach
/// them observe an internal error.
pub fn test_state() -> TestState {
    let resources = Arc::new(InMemoryResourceRepository::new());
    let audit = Arc::new(InMemoryAuditRepository::new());
    let profiles = Arc::new(InMemoryAccessProfileRepository::new());
    let (recorder, worker) = AuditRecorder::channel(
        audit.clone(),
        AuditDeliveryPolicy {
            queue_capacity: 64,
            max_attempts: 1,
            retry_base_delay: Duration::ZERO,
        },
    );

    let identity_resolver = IdentityResolver::new(profiles.clone(), MissingProfilePolicy::Deny);
    let resource_service = ResourceService::new(resources.clone(), recorder.clone());
    let http_client = reqwest::Client::new();
    let Ok(auth_provider) = HttpAuthProvider::new(http_client.clone(), UNREACHABLE_BACKEND, "anon")
    else {
        panic!("test auth provider must build");
    };
    let Ok(function_gateway) = HttpFunctionGateway::new(http_client, UNREACHABLE_BACKEND, "service")
    else {
        panic!("test function gateway must build");
    };
    let Ok(postgres_pool) = PgPoolOptions::new().connect_lazy("postgres://localhost/pondok_test")
    else {
        panic!("lazy pool must build");
    };

    let state = AppState {
        auth_service: AuthService::new(
            Arc::new(auth_provider),
            identity_resolver.clone(),
            recorder.clone(),
        ),
        identity_resolver,
        function_service: PrivilegedFunctionService::new(
            Arc::new(function_gateway),
            resource_service.clone(),
            recorder.clone(),
        ),
        resource_service,
        audit_log_service: AuditLogService::new(audit.clone()),
        access_profile_service: AccessProfileService::new(profiles, recorder),
        postgres_pool,
        frontend_url: "http://localhost:3000".to_owned(),
    };

    TestState {
        state,
        resources,
        audit,
        worker,
    }
}

pub fn identity(role: Role, gender: GenderScope, department: DepartmentScope) -> ResolvedIdentity {
    ResolvedIdentity::new(
        AccountId::new(),
        format!("{} tester", role.as_str()),
        None,
        role,
        AccessScope::new(gender, department),
        true,
    )
}
