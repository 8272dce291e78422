mod admin;
mod auth;
mod common;
mod resources;

pub use admin::{
    AccessProfileResponse, AuditLogEntryResponse, AuditLogParams, PaymentTokenResponse,
    SaveAccessProfileRequest,
};
pub use auth::{IdentityResponse, LoginRequest, LoginResponse};
pub use common::{HealthDependencyStatus, HealthResponse};
pub use resources::{
    ExportRecordsRequest, ExportResponse, ListRecordsParams, QueryRecordsRequest,
    ResourceCountResponse, ResourceRecordResponse, WriteRecordRequest,
};
