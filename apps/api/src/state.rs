use pondok_application::{
    AccessProfileService, AuditLogService, AuthService, IdentityResolver,
    PrivilegedFunctionService, ResourceService,
};
use sqlx::PgPool;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub identity_resolver: IdentityResolver,
    pub resource_service: ResourceService,
    pub audit_log_service: AuditLogService,
    pub access_profile_service: AccessProfileService,
    pub function_service: PrivilegedFunctionService,
    pub postgres_pool: PgPool,
    pub frontend_url: String,
}
