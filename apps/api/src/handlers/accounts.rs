use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use pondok_core::AccountId;
use pondok_domain::ResolvedIdentity;

use crate::dto::{AccessProfileResponse, SaveAccessProfileRequest};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_access_profiles_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<ResolvedIdentity>,
) -> ApiResult<Json<Vec<AccessProfileResponse>>> {
    let profiles = state
        .access_profile_service
        .list_profiles(&identity)
        .await?
        .into_iter()
        .map(AccessProfileResponse::from)
        .collect();

    Ok(Json(profiles))
}

pub async fn save_access_profile_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<ResolvedIdentity>,
    Path(account_id): Path<String>,
    Json(payload): Json<SaveAccessProfileRequest>,
) -> ApiResult<Json<AccessProfileResponse>> {
    let account_id = AccountId::from_str(account_id.as_str())?;
    let profile = state
        .access_profile_service
        .save_profile(&identity, payload.into_input(account_id))
        .await?;

    Ok(Json(AccessProfileResponse::from(profile)))
}

pub async fn delete_admin_account_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<ResolvedIdentity>,
    Path(account_id): Path<String>,
) -> ApiResult<StatusCode> {
    let account_id = AccountId::from_str(account_id.as_str())?;
    state
        .function_service
        .delete_admin_account(&identity, account_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
