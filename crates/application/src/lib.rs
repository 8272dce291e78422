//! Application services and ports.

#![forbid(unsafe_code)]

mod access_profile_service;
mod audit_service;
mod auth_service;
mod function_service;
mod identity_service;
mod resource_service;

#[cfg(test)]
mod test_support;

pub use access_profile_service::{AccessProfileService, SaveAccessProfileInput};
pub use audit_service::{
    AuditDeliveryPolicy, AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository,
    AuditLogService, AuditRecorder, AuditRepository, AuditWorker,
};
pub use auth_service::{AuthProvider, AuthService, AuthSession, LoginOutcome, SignInCredentials};
pub use function_service::{
    DELETE_ADMIN_FUNCTION, FunctionGateway, PAYMENT_TOKEN_FUNCTION, PaymentToken,
    PrivilegedFunctionService,
};
pub use identity_service::{
    AccessProfileRepository, FALLBACK_ROLE, IdentityResolver, MissingProfilePolicy,
};
pub use resource_service::{ResourceCount, ResourceListInput, ResourceRepository, ResourceService};
