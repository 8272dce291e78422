use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use pondok_core::{AccountId, AppError, AppResult, AuthenticatedAccount};
use pondok_domain::{AccessProfile, AccessScope, ResolvedIdentity, Role};
use tracing::warn;

/// Role assigned when no access profile can be read.
pub const FALLBACK_ROLE: Role = Role::Dewan;

const FALLBACK_DISPLAY_NAME: &str = "Pengguna";

/// Repository port for access profiles.
#[async_trait]
pub trait AccessProfileRepository: Send + Sync {
    /// Finds the profile owned by an account.
    async fn find_profile(&self, account_id: AccountId) -> AppResult<Option<AccessProfile>>;

    /// Lists every profile.
    async fn list_profiles(&self) -> AppResult<Vec<AccessProfile>>;

    /// Creates or replaces the profile of an account.
    async fn save_profile(&self, profile: AccessProfile) -> AppResult<AccessProfile>;
}

/// Behaviour when a signed-in account has no readable access profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingProfilePolicy {
    /// Resolve to [`FALLBACK_ROLE`] with unrestricted scopes.
    #[default]
    DefaultRole,
    /// Treat the account as unauthenticated.
    Deny,
}

impl MissingProfilePolicy {
    /// Returns a stable configuration value for this policy.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DefaultRole => "default_role",
            Self::Deny => "deny",
        }
    }
}

impl FromStr for MissingProfilePolicy {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "default_role" => Ok(Self::DefaultRole),
            "deny" => Ok(Self::Deny),
            _ => Err(AppError::Validation(format!(
                "missing profile policy must be 'default_role' or 'deny', got '{value}'"
            ))),
        }
    }
}

/// Resolves signed-in accounts into role- and scope-bearing identities.
#[derive(Clone)]
pub struct IdentityResolver {
    repository: Arc<dyn AccessProfileRepository>,
    policy: MissingProfilePolicy,
}

impl IdentityResolver {
    /// Creates a resolver from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn AccessProfileRepository>, policy: MissingProfilePolicy) -> Self {
        Self { repository, policy }
    }

    /// Returns the configured missing-profile policy.
    #[must_use]
    pub fn policy(&self) -> MissingProfilePolicy {
        self.policy
    }

    /// Resolves an account into an identity.
    ///
    /// Returns `None` for an unauthenticated caller, or when the profile is
    /// missing under [`MissingProfilePolicy::Deny`]. Store errors are logged
    /// and handled like a missing profile.
    pub async fn resolve(&self, account: Option<&AuthenticatedAccount>) -> Option<ResolvedIdentity> {
        let account = account?;

        let profile = match self.repository.find_profile(account.account_id()).await {
            Ok(profile) => profile,
            Err(error) => {
                warn!(
                    error = %error,
                    account_id = %account.account_id(),
                    "access profile lookup failed"
                );
                None
            }
        };

        if let Some(profile) = profile {
            return Some(ResolvedIdentity::new(
                account.account_id(),
                display_name(account, Some(&profile)),
                profile
                    .photo_url()
                    .or(account.avatar_url())
                    .map(ToOwned::to_owned),
                profile.role(),
                profile.scope(),
                profile.is_active(),
            ));
        }

        match self.policy {
            MissingProfilePolicy::DefaultRole => {
                warn!(
                    account_id = %account.account_id(),
                    fallback_role = FALLBACK_ROLE.as_str(),
                    "no access profile, resolving with fallback role"
                );
                Some(ResolvedIdentity::new(
                    account.account_id(),
                    display_name(account, None),
                    account.avatar_url().map(ToOwned::to_owned),
                    FALLBACK_ROLE,
                    AccessScope::unrestricted(),
                    true,
                ))
            }
            MissingProfilePolicy::Deny => {
                warn!(
                    account_id = %account.account_id(),
                    "no access profile, denying access"
                );
                None
            }
        }
    }
}

fn display_name(account: &AuthenticatedAccount, profile: Option<&AccessProfile>) -> String {
    profile
        .and_then(AccessProfile::full_name)
        .or(account.display_name())
        .or(account.email())
        .unwrap_or(FALLBACK_DISPLAY_NAME)
        .to_owned()
}
