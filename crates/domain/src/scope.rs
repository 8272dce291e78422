//! Scope predicate derivation and the scoped query every resource read goes through.

use std::cmp::Ordering;

use pondok_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{DepartmentScope, GenderScope, ResolvedIdentity, ResourceKind, Role};

/// Largest page a list query may request.
pub const MAX_PAGE_SIZE: usize = 200;

/// Row cap applied to exports.
pub const EXPORT_ROW_LIMIT: usize = 5_000;

/// Abstract scope dimension a predicate applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeField {
    /// Gender-bearing field of a resource.
    Gender,
    /// Department-bearing field of a resource.
    Department,
}

/// Filter operators understood by the data store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    /// Equality comparison.
    Eq,
    /// Greater-than-or-equal comparison.
    Gte,
    /// Less-than-or-equal comparison.
    Lte,
    /// Case-insensitive substring match for text values.
    Contains,
}

/// Predicate produced by scope derivation, before it is bound to a resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopePredicate {
    /// Scope dimension.
    pub field: ScopeField,
    /// Comparison operator.
    pub operator: FilterOperator,
    /// Scope value, for example `L` or `KITAB`.
    pub value: String,
}

/// Derives the predicates that must be ANDed onto reads for a role and scope.
///
/// Emits one equality predicate per restricted dimension and nothing for
/// `ALL`. The role does not exempt anyone from scoping; broad roles get broad
/// visibility by being provisioned with `ALL` scopes.
#[must_use]
pub fn derive_filters(
    _role: Role,
    gender: GenderScope,
    department: DepartmentScope,
) -> Vec<ScopePredicate> {
    let mut predicates = Vec::with_capacity(2);

    if gender != GenderScope::All {
        predicates.push(ScopePredicate {
            field: ScopeField::Gender,
            operator: FilterOperator::Eq,
            value: gender.as_str().to_owned(),
        });
    }

    if department != DepartmentScope::All {
        predicates.push(ScopePredicate {
            field: ScopeField::Department,
            operator: FilterOperator::Eq,
            value: department.as_str().to_owned(),
        });
    }

    predicates
}

/// Concrete predicate on one resource data field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryFilter {
    field: NonEmptyString,
    operator: FilterOperator,
    value: Value,
}

impl QueryFilter {
    /// Creates a validated filter.
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: Value) -> AppResult<Self> {
        let field = NonEmptyString::new(field)?;

        match operator {
            FilterOperator::Eq => {
                if value.is_array() || value.is_object() {
                    return Err(AppError::Validation(format!(
                        "filter on '{}' must compare against a scalar value",
                        field.as_str()
                    )));
                }
            }
            FilterOperator::Gte | FilterOperator::Lte => {
                if !(value.is_number() || value.is_string()) {
                    return Err(AppError::Validation(format!(
                        "range filter on '{}' requires a number or string value",
                        field.as_str()
                    )));
                }
            }
            FilterOperator::Contains => {
                if !value.is_string() {
                    return Err(AppError::Validation(format!(
                        "contains filter on '{}' requires a string value",
                        field.as_str()
                    )));
                }
            }
        }

        Ok(Self {
            field,
            operator,
            value,
        })
    }

    /// Returns the data field name.
    #[must_use]
    pub fn field(&self) -> &str {
        self.field.as_str()
    }

    /// Returns the operator.
    #[must_use]
    pub fn operator(&self) -> FilterOperator {
        self.operator
    }

    /// Returns the comparison value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Evaluates the predicate against a record payload.
    #[must_use]
    pub fn matches(&self, data: &Value) -> bool {
        let Some(actual) = data.get(self.field.as_str()) else {
            return false;
        };

        match self.operator {
            // Numbers compare by value so `1` and `1.0` agree with jsonb equality.
            FilterOperator::Eq => match (actual, &self.value) {
                (Value::Number(_), Value::Number(_)) => {
                    compare_values(actual, &self.value) == Some(Ordering::Equal)
                }
                _ => actual == &self.value,
            },
            FilterOperator::Gte => {
                matches!(compare_values(actual, &self.value), Some(Ordering::Greater | Ordering::Equal))
            }
            FilterOperator::Lte => {
                matches!(compare_values(actual, &self.value), Some(Ordering::Less | Ordering::Equal))
            }
            FilterOperator::Contains => match (actual.as_str(), self.value.as_str()) {
                (Some(actual), Some(needle)) => {
                    actual.to_lowercase().contains(needle.to_lowercase().as_str())
                }
                _ => false,
            },
        }
    }
}

fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => left.as_f64()?.partial_cmp(&right.as_f64()?),
        (Value::String(left), Value::String(right)) => Some(left.as_str().cmp(right.as_str())),
        _ => None,
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

/// Sort on one resource data field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSort {
    field: NonEmptyString,
    direction: SortDirection,
}

impl ResourceSort {
    /// Creates a validated sort clause.
    pub fn new(field: impl Into<String>, direction: SortDirection) -> AppResult<Self> {
        Ok(Self {
            field: NonEmptyString::new(field)?,
            direction,
        })
    }

    /// Returns the data field name.
    #[must_use]
    pub fn field(&self) -> &str {
        self.field.as_str()
    }

    /// Returns the direction.
    #[must_use]
    pub fn direction(&self) -> SortDirection {
        self.direction
    }
}

/// Read query that always carries the caller's scope predicates.
///
/// The only constructor takes a resolved identity, so a repository that
/// accepts `ScopedQuery` cannot be called without scoping.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopedQuery {
    resource: ResourceKind,
    scope_filters: Vec<QueryFilter>,
    filters: Vec<QueryFilter>,
    sort: Option<ResourceSort>,
    limit: usize,
    offset: usize,
}

impl ScopedQuery {
    /// Builds a query for a resource narrowed to the identity's scope.
    #[must_use]
    pub fn new(identity: &ResolvedIdentity, resource: ResourceKind) -> Self {
        let scope = identity.scope();
        let scope_filters = derive_filters(identity.role(), scope.gender(), scope.department())
            .into_iter()
            .filter_map(|predicate| {
                let field = resource.scope_field_name(predicate.field)?;
                QueryFilter::new(field, predicate.operator, Value::String(predicate.value)).ok()
            })
            .collect();

        Self {
            resource,
            scope_filters,
            filters: Vec::new(),
            sort: None,
            limit: 50,
            offset: 0,
        }
    }

    /// Adds caller-supplied filters.
    #[must_use]
    pub fn with_filters(mut self, filters: Vec<QueryFilter>) -> Self {
        self.filters.extend(filters);
        self
    }

    /// Sets the sort clause.
    #[must_use]
    pub fn with_sort(mut self, sort: Option<ResourceSort>) -> Self {
        self.sort = sort;
        self
    }

    /// Sets paging, capping the page size.
    #[must_use]
    pub fn with_page(mut self, limit: usize, offset: usize) -> Self {
        self.limit = limit.clamp(1, MAX_PAGE_SIZE);
        self.offset = offset;
        self
    }

    /// Switches the query to export paging.
    #[must_use]
    pub fn for_export(mut self) -> Self {
        self.limit = EXPORT_ROW_LIMIT;
        self.offset = 0;
        self
    }

    /// Returns the queried resource.
    #[must_use]
    pub fn resource(&self) -> ResourceKind {
        self.resource
    }

    /// Returns the scope predicates only.
    #[must_use]
    pub fn scope_filters(&self) -> &[QueryFilter] {
        &self.scope_filters
    }

    /// Returns scope and caller predicates, scope first.
    pub fn predicates(&self) -> impl Iterator<Item = &QueryFilter> {
        self.scope_filters.iter().chain(self.filters.iter())
    }

    /// Returns the sort clause.
    #[must_use]
    pub fn sort(&self) -> Option<&ResourceSort> {
        self.sort.as_ref()
    }

    /// Returns the page size.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Returns the page offset.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns whether a payload satisfies every predicate.
    #[must_use]
    pub fn matches(&self, data: &Value) -> bool {
        self.predicates().all(|filter| filter.matches(data))
    }

    /// Returns whether a payload lies inside the caller's scope.
    #[must_use]
    pub fn scope_admits(&self, data: &Value) -> bool {
        self.scope_filters.iter().all(|filter| filter.matches(data))
    }
}
