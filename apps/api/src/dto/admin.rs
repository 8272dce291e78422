use std::str::FromStr;

use pondok_application::{AuditLogEntry, AuditLogQuery, PaymentToken, SaveAccessProfileInput};
use pondok_core::{AccountId, AppResult};
use pondok_domain::{
    AccessProfile, AccessScope, AuditAction, DepartmentScope, GenderScope, Role,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

const DEFAULT_AUDIT_PAGE_SIZE: usize = 50;

/// Query string accepted by the audit log endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct AuditLogParams {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub action: Option<String>,
    pub actor_id: Option<String>,
}

impl AuditLogParams {
    pub fn into_query(self) -> AppResult<AuditLogQuery> {
        let action = self
            .action
            .filter(|value| !value.trim().is_empty())
            .map(|value| AuditAction::from_str(value.trim()))
            .transpose()?;

        Ok(AuditLogQuery {
            limit: self.limit.unwrap_or(DEFAULT_AUDIT_PAGE_SIZE),
            offset: self.offset.unwrap_or_default(),
            action,
            actor_id: self.actor_id.filter(|value| !value.trim().is_empty()),
        })
    }
}

/// API representation of an audit log entry.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/audit-log-entry-response.ts"
)]
pub struct AuditLogEntryResponse {
    pub event_id: String,
    pub created_at: String,
    pub actor_id: String,
    pub actor_name: String,
    pub actor_role: String,
    pub action: String,
    pub resource_name: String,
    pub record_id: String,
    #[ts(type = "Record<string, unknown>")]
    pub details: Value,
}

impl From<AuditLogEntry> for AuditLogEntryResponse {
    fn from(value: AuditLogEntry) -> Self {
        Self {
            event_id: value.event_id,
            created_at: value.created_at,
            actor_id: value.actor_id,
            actor_name: value.actor_name,
            actor_role: value.actor_role,
            action: value.action,
            resource_name: value.resource_name,
            record_id: value.record_id,
            details: value.details,
        }
    }
}

/// API representation of an access profile.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/access-profile-response.ts"
)]
pub struct AccessProfileResponse {
    pub account_id: String,
    pub full_name: Option<String>,
    pub photo_url: Option<String>,
    pub role: String,
    pub gender_scope: String,
    pub department_scope: String,
    pub is_active: bool,
}

impl From<AccessProfile> for AccessProfileResponse {
    fn from(profile: AccessProfile) -> Self {
        Self {
            account_id: profile.account_id().to_string(),
            full_name: profile.full_name().map(ToOwned::to_owned),
            photo_url: profile.photo_url().map(ToOwned::to_owned),
            role: profile.role().as_str().to_owned(),
            gender_scope: profile.scope().gender().as_str().to_owned(),
            department_scope: profile.scope().department().as_str().to_owned(),
            is_active: profile.is_active(),
        }
    }
}

/// Incoming access profile upsert payload.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/save-access-profile-request.ts"
)]
pub struct SaveAccessProfileRequest {
    pub full_name: Option<String>,
    pub photo_url: Option<String>,
    #[ts(type = "\"super_admin\" | \"rois\" | \"bendahara\" | \"kesantrian\" | \"dewan\"")]
    pub role: Role,
    #[ts(type = "\"L\" | \"P\" | \"ALL\"")]
    pub gender_scope: GenderScope,
    #[ts(type = "\"KITAB\" | \"TAHFIDZ\" | \"ALL\"")]
    pub department_scope: DepartmentScope,
    pub is_active: bool,
}

impl SaveAccessProfileRequest {
    pub fn into_input(self, account_id: AccountId) -> SaveAccessProfileInput {
        SaveAccessProfileInput {
            account_id,
            full_name: self.full_name.filter(|value| !value.trim().is_empty()),
            photo_url: self.photo_url.filter(|value| !value.trim().is_empty()),
            role: self.role,
            scope: AccessScope::new(self.gender_scope, self.department_scope),
            is_active: self.is_active,
        }
    }
}

/// Payment gateway token for the payment widget.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/payment-token-response.ts"
)]
pub struct PaymentTokenResponse {
    pub token: String,
    pub redirect_url: Option<String>,
}

impl From<PaymentToken> for PaymentTokenResponse {
    fn from(value: PaymentToken) -> Self {
        Self {
            token: value.token,
            redirect_url: value.redirect_url,
        }
    }
}
