use pondok_application::{ResourceCount, ResourceListInput};
use pondok_core::AppResult;
use pondok_domain::{
    FilterOperator, QueryFilter, ResourceRecord, ResourceSort, SortDirection,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

const DEFAULT_PAGE_SIZE: usize = 50;

/// Incoming record create or update payload.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/write-record-request.ts"
)]
pub struct WriteRecordRequest {
    #[ts(type = "Record<string, unknown>")]
    pub data: Value,
}

/// One caller-supplied filter condition.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/record-filter-request.ts"
)]
pub struct RecordFilterRequest {
    pub field: String,
    #[ts(type = "\"eq\" | \"gte\" | \"lte\" | \"contains\"")]
    pub operator: FilterOperator,
    #[ts(type = "unknown")]
    pub value: Value,
}

/// Sort clause for record queries.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/record-sort-request.ts"
)]
pub struct RecordSortRequest {
    pub field: String,
    #[ts(type = "\"asc\" | \"desc\"")]
    pub direction: SortDirection,
}

/// Query string accepted by the record list endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ListRecordsParams {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub sort: Option<String>,
    pub direction: Option<SortDirection>,
}

/// Record query payload with caller filters.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/query-records-request.ts"
)]
pub struct QueryRecordsRequest {
    pub filters: Option<Vec<RecordFilterRequest>>,
    pub sort: Option<RecordSortRequest>,
    #[ts(type = "number | null")]
    pub limit: Option<usize>,
    #[ts(type = "number | null")]
    pub offset: Option<usize>,
}

/// Export payload; filters narrow the visible rows further.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/export-records-request.ts"
)]
pub struct ExportRecordsRequest {
    pub filters: Option<Vec<RecordFilterRequest>>,
}

/// API representation of a stored record.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/resource-record-response.ts"
)]
pub struct ResourceRecordResponse {
    pub id: String,
    pub resource: String,
    #[ts(type = "Record<string, unknown>")]
    pub data: Value,
    pub created_at: String,
}

/// JSON export document.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/export-response.ts"
)]
pub struct ExportResponse {
    pub resource: String,
    pub exported_at: String,
    #[ts(type = "number")]
    pub row_count: usize,
    pub rows: Vec<ResourceRecordResponse>,
}

/// Visible record count for one resource.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/resource-count-response.ts"
)]
pub struct ResourceCountResponse {
    pub resource: String,
    #[ts(type = "number")]
    pub total: u64,
}

impl ListRecordsParams {
    pub fn into_list_input(self) -> AppResult<ResourceListInput> {
        let sort = self
            .sort
            .filter(|field| !field.trim().is_empty())
            .map(|field| {
                ResourceSort::new(field.trim(), self.direction.unwrap_or(SortDirection::Asc))
            })
            .transpose()?;

        Ok(ResourceListInput {
            filters: Vec::new(),
            sort,
            limit: self.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            offset: self.offset.unwrap_or_default(),
        })
    }
}

impl QueryRecordsRequest {
    pub fn into_list_input(self) -> AppResult<ResourceListInput> {
        Ok(ResourceListInput {
            filters: convert_filters(self.filters)?,
            sort: self
                .sort
                .map(|sort| ResourceSort::new(sort.field, sort.direction))
                .transpose()?,
            limit: self.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            offset: self.offset.unwrap_or_default(),
        })
    }
}

impl ExportRecordsRequest {
    pub fn into_filters(self) -> AppResult<Vec<QueryFilter>> {
        convert_filters(self.filters)
    }
}

fn convert_filters(filters: Option<Vec<RecordFilterRequest>>) -> AppResult<Vec<QueryFilter>> {
    filters
        .unwrap_or_default()
        .into_iter()
        .map(|filter| QueryFilter::new(filter.field, filter.operator, filter.value))
        .collect()
}

impl From<ResourceRecord> for ResourceRecordResponse {
    fn from(record: ResourceRecord) -> Self {
        Self {
            id: record.record_id().to_owned(),
            resource: record.resource().as_str().to_owned(),
            created_at: record.created_at().to_owned(),
            data: record.data().clone(),
        }
    }
}

impl From<ResourceCount> for ResourceCountResponse {
    fn from(count: ResourceCount) -> Self {
        Self {
            resource: count.resource.as_str().to_owned(),
            total: count.total,
        }
    }
}
