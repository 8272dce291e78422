//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod http_auth_provider;
mod http_function_gateway;
mod in_memory_access_profile_repository;
mod in_memory_audit_repository;
mod in_memory_resource_repository;
mod postgres_access_profile_repository;
mod postgres_audit_log_repository;
mod postgres_audit_repository;
mod postgres_resource_repository;

pub use http_auth_provider::HttpAuthProvider;
pub use http_function_gateway::HttpFunctionGateway;
pub use in_memory_access_profile_repository::InMemoryAccessProfileRepository;
pub use in_memory_audit_repository::InMemoryAuditRepository;
pub use in_memory_resource_repository::InMemoryResourceRepository;
pub use postgres_access_profile_repository::PostgresAccessProfileRepository;
pub use postgres_audit_log_repository::PostgresAuditLogRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_resource_repository::PostgresResourceRepository;
