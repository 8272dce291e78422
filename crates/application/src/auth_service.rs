//! Session sign-in ports and the login flow.
//!
//! Credentials are verified by the hosted auth provider; this service only
//! turns a provider session into a resolved identity and a landing route.

use std::sync::Arc;

use async_trait::async_trait;
use pondok_core::{AppError, AppResult, AuthenticatedAccount};
use pondok_domain::{AuditAction, ResolvedIdentity};
use tracing::{info, warn};

use crate::{AuditRecorder, IdentityResolver};

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// Email and password submitted on the login form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInCredentials {
    /// Account email.
    pub email: String,
    /// Plaintext password, forwarded to the provider only.
    pub password: String,
}

/// Session issued by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    /// Signed-in account.
    pub account: AuthenticatedAccount,
    /// Provider access token.
    pub access_token: String,
}

/// Port for the hosted auth provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Exchanges credentials for a session.
    ///
    /// Rejected credentials must surface as [`AppError::Unauthorized`].
    async fn sign_in(&self, credentials: &SignInCredentials) -> AppResult<AuthSession>;

    /// Revokes a session.
    async fn sign_out(&self, access_token: &str) -> AppResult<()>;

    /// Returns the account behind a token, or `None` when it is no longer valid.
    async fn get_user(&self, access_token: &str) -> AppResult<Option<AuthenticatedAccount>>;
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// Provider session to keep server-side.
    pub session: AuthSession,
    /// Resolved caller identity.
    pub identity: ResolvedIdentity,
    /// Role landing route.
    pub redirect_to: &'static str,
}

/// Login, logout and session introspection.
#[derive(Clone)]
pub struct AuthService {
    provider: Arc<dyn AuthProvider>,
    resolver: IdentityResolver,
    audit: AuditRecorder,
}

impl AuthService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        provider: Arc<dyn AuthProvider>,
        resolver: IdentityResolver,
        audit: AuditRecorder,
    ) -> Self {
        Self {
            provider,
            resolver,
            audit,
        }
    }

    /// Signs in, resolves the identity and picks the landing route.
    pub async fn login(&self, credentials: SignInCredentials) -> AppResult<LoginOutcome> {
        let credentials = SignInCredentials {
            email: credentials.email.trim().to_owned(),
            password: credentials.password,
        };
        if credentials.email.is_empty() || credentials.password.is_empty() {
            return Err(AppError::Validation(
                "email and password are required".to_owned(),
            ));
        }

        let session = self.provider.sign_in(&credentials).await?;

        let Some(identity) = self.resolver.resolve(Some(&session.account)).await else {
            self.revoke(session.access_token.as_str()).await;
            return Err(AppError::Forbidden(
                "account has no access to the dashboard".to_owned(),
            ));
        };

        if !identity.is_active() {
            self.revoke(session.access_token.as_str()).await;
            return Err(AppError::Forbidden("account is deactivated".to_owned()));
        }

        self.audit.record(
            Some(&identity),
            AuditAction::Login,
            "auth",
            Some(identity.id().to_string().as_str()),
            None,
        );
        info!(
            account_id = %identity.id(),
            role = identity.role().as_str(),
            "admin signed in"
        );

        Ok(LoginOutcome {
            redirect_to: identity.role().landing_route(),
            session,
            identity,
        })
    }

    /// Ends a provider session. Provider failures are logged, never returned.
    pub async fn logout(&self, access_token: &str) {
        self.revoke(access_token).await;
    }

    /// Re-resolves the identity behind a stored session token.
    pub async fn current_identity(&self, access_token: &str) -> AppResult<ResolvedIdentity> {
        let account = self
            .provider
            .get_user(access_token)
            .await?
            .ok_or_else(|| AppError::Unauthorized("session has expired".to_owned()))?;

        self.resolver
            .resolve(Some(&account))
            .await
            .ok_or_else(|| AppError::Forbidden("account has no access to the dashboard".to_owned()))
    }

    async fn revoke(&self, access_token: &str) {
        if let Err(error) = self.provider.sign_out(access_token).await {
            warn!(error = %error, "failed to revoke provider session");
        }
    }
}
