//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod access;
mod audit;
mod resource;
mod routing;
mod scope;

pub use access::{AccessProfile, AccessScope, DepartmentScope, GenderScope, ResolvedIdentity, Role};
pub use audit::{
    AuditAction, AuditActor, DETAIL_PLACEHOLDER_MESSAGE, MAX_DETAIL_BYTES, MAX_DETAIL_DEPTH,
    MISSING_RECORD_ID, detail_placeholder, details_from, sanitize_details,
};
pub use resource::{
    DEPARTMENT_FIELD, GENDER_FIELD, ResourceKind, ResourceRecord, STUDENT_RELATION_FIELD,
    STUDENT_SCOPE_FIELDS, student_scope,
};
pub use routing::{BILLING_ROUTE, DASHBOARD_ROUTE, STUDENT_DATA_ROUTE, landing_route_for};
pub use scope::{
    EXPORT_ROW_LIMIT, FilterOperator, MAX_PAGE_SIZE, QueryFilter, ResourceSort, ScopeField,
    ScopePredicate, ScopedQuery, SortDirection, derive_filters,
};
