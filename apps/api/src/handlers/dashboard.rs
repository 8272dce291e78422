use axum::Json;
use axum::extract::{Extension, State};
use pondok_domain::ResolvedIdentity;

use crate::dto::ResourceCountResponse;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn summary_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<ResolvedIdentity>,
) -> ApiResult<Json<Vec<ResourceCountResponse>>> {
    let counts = state
        .resource_service
        .summarize(&identity)
        .await?
        .into_iter()
        .map(ResourceCountResponse::from)
        .collect();

    Ok(Json(counts))
}
