use axum::extract::{Request, State};
use axum::http::{Method, header};
use axum::middleware::Next;
use axum::response::Response;
use pondok_core::AppError;
use tower_sessions::Session;
use tracing::debug;

use crate::auth::read_session;
use crate::error::ApiResult;
use crate::state::AppState;

/// Resolves the session account into a fresh identity on every request.
pub async fn require_auth(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let stored = read_session(&session)
        .await?
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    let identity = state
        .identity_resolver
        .resolve(Some(&stored.account))
        .await
        .ok_or_else(|| AppError::Forbidden("account has no access to the dashboard".to_owned()))?;

    if !identity.is_active() {
        debug!(account_id = %identity.id(), "rejecting request from deactivated account");
        return Err(AppError::Forbidden("account is deactivated".to_owned()).into());
    }

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

pub async fn require_same_origin_for_mutations(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> ApiResult<Response> {
    if is_state_changing_method(request.method()) {
        let headers = request.headers();

        if headers
            .get("sec-fetch-site")
            .is_some_and(|fetch_site| fetch_site.as_bytes() == b"cross-site")
        {
            return Err(AppError::Unauthorized("cross-site request blocked".to_owned()).into());
        }

        let origin = headers
            .get(header::ORIGIN)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        let referer = headers
            .get(header::REFERER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();

        if !origin_is_allowed(state.frontend_url.as_str(), origin, referer) {
            return Err(AppError::Unauthorized("origin validation failed".to_owned()).into());
        }
    }

    Ok(next.run(request).await)
}

fn origin_is_allowed(allowed_origin: &str, origin: &str, referer: &str) -> bool {
    let allowed_origin = allowed_origin.trim_end_matches('/');
    origin == allowed_origin
        || referer == allowed_origin
        || referer
            .strip_prefix(allowed_origin)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn is_state_changing_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}
