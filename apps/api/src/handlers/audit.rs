use axum::Json;
use axum::extract::{Extension, Query, State};
use pondok_domain::ResolvedIdentity;

use crate::dto::{AuditLogEntryResponse, AuditLogParams};
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn list_audit_log_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<ResolvedIdentity>,
    Query(params): Query<AuditLogParams>,
) -> ApiResult<Json<Vec<AuditLogEntryResponse>>> {
    let entries = state
        .audit_log_service
        .list_audit_log(&identity, params.into_query()?)
        .await?
        .into_iter()
        .map(AuditLogEntryResponse::from)
        .collect();

    Ok(Json(entries))
}
