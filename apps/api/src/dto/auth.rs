use pondok_domain::ResolvedIdentity;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Login form payload.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/login-request.ts"
)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// API representation of the signed-in dashboard user.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/identity-response.ts"
)]
pub struct IdentityResponse {
    pub id: String,
    pub name: String,
    pub avatar: Option<String>,
    #[ts(type = "\"super_admin\" | \"rois\" | \"bendahara\" | \"kesantrian\" | \"dewan\"")]
    pub role: String,
    #[ts(type = "\"L\" | \"P\" | \"ALL\"")]
    pub gender_scope: String,
    #[ts(type = "\"KITAB\" | \"TAHFIDZ\" | \"ALL\"")]
    pub department_scope: String,
    pub is_active: bool,
}

/// Successful login payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/login-response.ts"
)]
pub struct LoginResponse {
    pub identity: IdentityResponse,
    pub redirect_to: String,
}

impl From<&ResolvedIdentity> for IdentityResponse {
    fn from(identity: &ResolvedIdentity) -> Self {
        Self {
            id: identity.id().to_string(),
            name: identity.name().to_owned(),
            avatar: identity.avatar().map(ToOwned::to_owned),
            role: identity.role().as_str().to_owned(),
            gender_scope: identity.scope().gender().as_str().to_owned(),
            department_scope: identity.scope().department().as_str().to_owned(),
            is_active: identity.is_active(),
        }
    }
}
