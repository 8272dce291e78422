use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use chrono::{SecondsFormat, Utc};
use pondok_core::AppResult;
use pondok_domain::{ResolvedIdentity, ResourceKind};
use tracing::info;

use crate::dto::{
    ExportRecordsRequest, ExportResponse, ListRecordsParams, QueryRecordsRequest,
    ResourceRecordResponse, WriteRecordRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;


fn resource_kind(resource_name: &str) -> AppResult<ResourceKind> {
    ResourceKind::from_str(resource_name)
}

pub async fn list_records_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<ResolvedIdentity>,
    Path(resource_name): Path<String>,
    Query(params): Query<ListRecordsParams>,
) -> ApiResult<Json<Vec<ResourceRecordResponse>>> {
    let records = state
        .resource_service
        .list_records(
            &identity,
            resource_kind(resource_name.as_str())?,
            params.into_list_input()?,
        )
        .await?
        .into_iter()
        .map(ResourceRecordResponse::from)
        .collect();

    Ok(Json(records))
}

pub async fn query_records_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<ResolvedIdentity>,
    Path(resource_name): Path<String>,
    Json(payload): Json<QueryRecordsRequest>,
) -> ApiResult<Json<Vec<ResourceRecordResponse>>> {
    let records = state
        .resource_service
        .list_records(
            &identity,
            resource_kind(resource_name.as_str())?,
            payload.into_list_input()?,
        )
        .await?
        .into_iter()
        .map(ResourceRecordResponse::from)
        .collect();

    Ok(Json(records))
}

pub async fn get_record_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<ResolvedIdentity>,
    Path((resource_name, record_id)): Path<(String, String)>,
) -> ApiResult<Json<ResourceRecordResponse>> {
    let record = state
        .resource_service
        .get_record(
            &identity,
            resource_kind(resource_name.as_str())?,
            record_id.as_str(),
        )
        .await?;

    Ok(Json(ResourceRecordResponse::from(record)))
}

pub async fn create_record_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<ResolvedIdentity>,
    Path(resource_name): Path<String>,
    Json(payload): Json<WriteRecordRequest>,
) -> ApiResult<(StatusCode, Json<ResourceRecordResponse>)> {
    let record = state
        .resource_service
        .create_record(
            &identity,
            resource_kind(resource_name.as_str())?,
            payload.data,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ResourceRecordResponse::from(record)),
    ))
}

pub async fn update_record_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<ResolvedIdentity>,
    Path((resource_name, record_id)): Path<(String, String)>,
    Json(payload): Json<WriteRecordRequest>,
) -> ApiResult<Json<ResourceRecordResponse>> {
    let record = state
        .resource_service
        .update_record(
            &identity,
            resource_kind(resource_name.as_str())?,
            record_id.as_str(),
            payload.data,
        )
        .await?;

    Ok(Json(ResourceRecordResponse::from(record)))
}

pub async fn delete_record_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<ResolvedIdentity>,
    Path((resource_name, record_id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    state
        .resource_service
        .delete_record(
            &identity,
            resource_kind(resource_name.as_str())?,
            record_id.as_str(),
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Builds a JSON export document from rows the actor may see.
pub async fn export_records_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<ResolvedIdentity>,
    Path(resource_name): Path<String>,
    Json(payload): Json<ExportRecordsRequest>,
) -> ApiResult<Json<ExportResponse>> {
    let resource = resource_kind(resource_name.as_str())?;
    let rows: Vec<ResourceRecordResponse> = state
        .resource_service
        .export_records(&identity, resource, payload.into_filters()?)
        .await?
        .into_iter()
        .map(ResourceRecordResponse::from)
        .collect();

    info!(
        resource = resource.as_str(),
        rows = rows.len(),
        actor_id = %identity.id(),
        "resource exported"
    );

    Ok(Json(ExportResponse {
        resource: resource.as_str().to_owned(),
        exported_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        row_count: rows.len(),
        rows,
    }))
}
