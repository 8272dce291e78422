use std::sync::Arc;

use pondok_core::{AccountId, AppError, AppResult};
use pondok_domain::{AccessProfile, AccessScope, AuditAction, ResolvedIdentity, Role};
use serde_json::json;

use crate::{AccessProfileRepository, AuditRecorder};

/// Input payload for creating or replacing an access profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveAccessProfileInput {
    /// Account the profile belongs to.
    pub account_id: AccountId,
    /// Display name shown in the dashboard.
    pub full_name: Option<String>,
    /// Profile photo URL.
    pub photo_url: Option<String>,
    /// Assigned role.
    pub role: Role,
    /// Assigned gender and department scope.
    pub scope: AccessScope,
    /// Whether the account may use the dashboard.
    pub is_active: bool,
}

/// Administration of role and scope assignments.
#[derive(Clone)]
pub struct AccessProfileService {
    repository: Arc<dyn AccessProfileRepository>,
    audit: AuditRecorder,
}

impl AccessProfileService {
    /// Creates the service.
    #[must_use]
    pub fn new(repository: Arc<dyn AccessProfileRepository>, audit: AuditRecorder) -> Self {
        Self { repository, audit }
    }

    /// Lists every access profile.
    pub async fn list_profiles(&self, actor: &ResolvedIdentity) -> AppResult<Vec<AccessProfile>> {
        require_account_manager(actor)?;
        self.repository.list_profiles().await
    }

    /// Creates or replaces an access profile.
    ///
    /// An administrator cannot remove their own administrator role or
    /// deactivate themselves.
    pub async fn save_profile(
        &self,
        actor: &ResolvedIdentity,
        input: SaveAccessProfileInput,
    ) -> AppResult<AccessProfile> {
        require_account_manager(actor)?;

        if input.account_id == actor.id()
            && (!input.role.can_manage_accounts() || !input.is_active)
        {
            return Err(AppError::Conflict(
                "administrators cannot demote or deactivate their own account".to_owned(),
            ));
        }

        let previous = self.repository.find_profile(input.account_id).await?;
        let profile = self
            .repository
            .save_profile(AccessProfile::new(
                input.account_id,
                input.full_name,
                input.photo_url,
                input.role,
                input.scope,
                input.is_active,
            ))
            .await?;

        self.audit.record(
            Some(actor),
            AuditAction::Update,
            "access_profile",
            Some(profile.account_id().to_string().as_str()),
            Some(json!({
                "previous": previous,
                "current": &profile,
            })),
        );

        Ok(profile)
    }
}

fn require_account_manager(actor: &ResolvedIdentity) -> AppResult<()> {
    if actor.is_active() && actor.role().can_manage_accounts() {
        return Ok(());
    }

    Err(AppError::Forbidden(format!(
        "role '{}' may not manage admin accounts",
        actor.role()
    )))
}
