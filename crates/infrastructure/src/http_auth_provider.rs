//! Hosted auth provider reached over its REST API.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use url::Url;
use uuid::Uuid;

use pondok_application::{AuthProvider, AuthSession, SignInCredentials};
use pondok_core::{AccountId, AppError, AppResult, AuthenticatedAccount};

/// Auth provider client authenticating with the public anon key.
#[derive(Clone)]
pub struct HttpAuthProvider {
    http_client: reqwest::Client,
    base_url: Url,
    anon_key: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: UserPayload,
}

#[derive(Debug, Default, Deserialize)]
struct UserMetadata {
    full_name: Option<String>,
    name: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: Uuid,
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}

impl From<UserPayload> for AuthenticatedAccount {
    fn from(user: UserPayload) -> Self {
        let UserMetadata {
            full_name,
            name,
            avatar_url,
        } = user.user_metadata;

        AuthenticatedAccount::new(
            AccountId::from_uuid(user.id),
            user.email,
            full_name.or(name),
            avatar_url,
        )
    }
}

impl HttpAuthProvider {
    /// Creates a client for the backend at `base_url`.
    pub fn new(
        http_client: reqwest::Client,
        base_url: &str,
        anon_key: impl Into<String>,
    ) -> AppResult<Self> {
        Ok(Self {
            http_client,
            base_url: normalized_base_url(base_url)?,
            anon_key: anon_key.into(),
        })
    }

    fn endpoint(&self, path: &str) -> AppResult<Url> {
        self.base_url.join(path).map_err(|error| {
            AppError::Internal(format!("invalid auth endpoint '{path}': {error}"))
        })
    }
}

/// Parses a base URL so relative joins keep its path.
pub(crate) fn normalized_base_url(base_url: &str) -> AppResult<Url> {
    let trimmed = base_url.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_owned()
    } else {
        format!("{trimmed}/")
    };

    Url::parse(with_slash.as_str())
        .map_err(|error| AppError::Validation(format!("invalid backend URL '{trimmed}': {error}")))
}

#[async_trait]
impl AuthProvider for HttpAuthProvider {
    async fn sign_in(&self, credentials: &SignInCredentials) -> AppResult<AuthSession> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let response = self
            .http_client
            .post(url)
            .header("apikey", self.anon_key.as_str())
            .json(&json!({
                "email": credentials.email,
                "password": credentials.password,
            }))
            .send()
            .await
            .map_err(|error| AppError::Internal(format!("auth provider unreachable: {error}")))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                return Err(AppError::Unauthorized(
                    "invalid login credentials".to_owned(),
                ));
            }
            status => {
                return Err(AppError::Internal(format!(
                    "auth provider rejected sign-in with status {status}"
                )));
            }
        }

        let token = response.json::<TokenResponse>().await.map_err(|error| {
            AppError::Internal(format!("invalid auth provider token response: {error}"))
        })?;

        Ok(AuthSession {
            account: token.user.into(),
            access_token: token.access_token,
        })
    }

    async fn sign_out(&self, access_token: &str) -> AppResult<()> {
        let response = self
            .http_client
            .post(self.endpoint("auth/v1/logout")?)
            .header("apikey", self.anon_key.as_str())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|error| AppError::Internal(format!("auth provider unreachable: {error}")))?;

        let status = response.status();
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            return Ok(());
        }

        Err(AppError::Internal(format!(
            "auth provider rejected sign-out with status {status}"
        )))
    }

    async fn get_user(&self, access_token: &str) -> AppResult<Option<AuthenticatedAccount>> {
        let response = self
            .http_client
            .get(self.endpoint("auth/v1/user")?)
            .header("apikey", self.anon_key.as_str())
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|error| AppError::Internal(format!("auth provider unreachable: {error}")))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Ok(None),
            status => {
                return Err(AppError::Internal(format!(
                    "auth provider rejected user lookup with status {status}"
                )));
            }
        }

        let user = response.json::<UserPayload>().await.map_err(|error| {
            AppError::Internal(format!("invalid auth provider user response: {error}"))
        })?;

        Ok(Some(user.into()))
    }
}
