use std::sync::Arc;

use pondok_application::{
    AccessProfileService, AuditLogService, AuditRecorder, AuditWorker, AuthService,
    IdentityResolver, PrivilegedFunctionService, ResourceService,
};
use pondok_core::AppError;
use pondok_infrastructure::{
    HttpAuthProvider, HttpFunctionGateway, PostgresAccessProfileRepository,
    PostgresAuditLogRepository, PostgresAuditRepository, PostgresResourceRepository,
};
use sqlx::PgPool;

use crate::api_config::ApiConfig;
use crate::state::AppState;

/// Wires services over Postgres and the hosted backend.
///
/// The returned worker drains the audit queue and must be spawned.
pub fn build_app_state(pool: PgPool, config: &ApiConfig) -> Result<(AppState, AuditWorker), AppError> {
    let (audit_recorder, audit_worker) = AuditRecorder::channel(
        Arc::new(PostgresAuditRepository::new(pool.clone())),
        config.audit_delivery,
    );

    let http_client = reqwest::Client::new();
    let auth_provider = HttpAuthProvider::new(
        http_client.clone(),
        config.backend.base_url.as_str(),
        config.backend.anon_key.clone(),
    )?;
    let function_gateway = HttpFunctionGateway::new(
        http_client,
        config.backend.base_url.as_str(),
        config.backend.service_key.clone(),
    )?;

    let profile_repository = Arc::new(PostgresAccessProfileRepository::new(pool.clone()));
    let identity_resolver =
        IdentityResolver::new(profile_repository.clone(), config.missing_profile_policy);
    let resource_service = ResourceService::new(
        Arc::new(PostgresResourceRepository::new(pool.clone())),
        audit_recorder.clone(),
    );

    let app_state = AppState {
        auth_service: AuthService::new(
            Arc::new(auth_provider),
            identity_resolver.clone(),
            audit_recorder.clone(),
        ),
        identity_resolver,
        function_service: PrivilegedFunctionService::new(
            Arc::new(function_gateway),
            resource_service.clone(),
            audit_recorder.clone(),
        ),
        resource_service,
        audit_log_service: AuditLogService::new(Arc::new(PostgresAuditLogRepository::new(
            pool.clone(),
        ))),
        access_profile_service: AccessProfileService::new(profile_repository, audit_recorder),
        postgres_pool: pool,
        frontend_url: config.frontend_url.clone(),
    };

    Ok((app_state, audit_worker))
}
