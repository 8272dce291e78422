//! Session endpoints.
//!
//! The provider access token never leaves the server: it is kept in the
//! session store next to the account it belongs to.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use pondok_application::SignInCredentials;
use pondok_core::{AppError, AppResult, AuthenticatedAccount};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::dto::{IdentityResponse, LoginRequest, LoginResponse};
use crate::error::ApiResult;
use crate::state::AppState;

pub const SESSION_KEY: &str = "pondok_session";

/// Provider session stored server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSession {
    pub account: AuthenticatedAccount,
    pub access_token: String,
}

pub async fn login_handler(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let outcome = state
        .auth_service
        .login(SignInCredentials {
            email: payload.email,
            password: payload.password,
        })
        .await?;

    session
        .cycle_id()
        .await
        .map_err(|error| AppError::Internal(format!("failed to rotate session id: {error}")))?;
    session
        .insert(
            SESSION_KEY,
            StoredSession {
                account: outcome.session.account,
                access_token: outcome.session.access_token,
            },
        )
        .await
        .map_err(|error| AppError::Internal(format!("failed to persist session: {error}")))?;

    Ok(Json(LoginResponse {
        identity: IdentityResponse::from(&outcome.identity),
        redirect_to: outcome.redirect_to.to_owned(),
    }))
}

pub async fn logout_handler(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<StatusCode> {
    let stored = read_session(&session).await?;

    if let Some(stored) = stored {
        state.auth_service.logout(stored.access_token.as_str()).await;
    }

    session
        .delete()
        .await
        .map_err(|error| AppError::Internal(format!("failed to delete session: {error}")))?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn me_handler(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<Json<IdentityResponse>> {
    let stored = read_session(&session)
        .await?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    let identity = state
        .auth_service
        .current_identity(stored.access_token.as_str())
        .await?;

    Ok(Json(IdentityResponse::from(&identity)))
}

pub(crate) async fn read_session(session: &Session) -> AppResult<Option<StoredSession>> {
    session
        .get::<StoredSession>(SESSION_KEY)
        .await
        .map_err(|error| AppError::Internal(format!("failed to read session: {error}")))
}
