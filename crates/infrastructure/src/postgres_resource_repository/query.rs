use serde_json::Value;
use sqlx::{Postgres, QueryBuilder};

use pondok_domain::{FilterOperator, QueryFilter, ResourceSort, SortDirection};

/// Appends ` AND <predicate>` for every filter.
pub(super) fn push_predicates<'args>(
    builder: &mut QueryBuilder<'args, Postgres>,
    filters: impl Iterator<Item = &'args QueryFilter>,
) {
    for filter in filters {
        builder.push(" AND ");
        push_filter_condition(builder, filter);
    }
}

fn push_filter_condition<'args>(builder: &mut QueryBuilder<'args, Postgres>, filter: &'args QueryFilter) {
    match filter.operator() {
        FilterOperator::Eq => {
            builder.push("data -> ");
            builder.push_bind(filter.field());
            builder.push(" = ");
            builder.push_bind(filter.value());
        }
        FilterOperator::Gte | FilterOperator::Lte => {
            let operator = if filter.operator() == FilterOperator::Gte {
                ">="
            } else {
                "<="
            };

            match filter.value() {
                Value::Number(number) => {
                    // Non-numeric values never match instead of failing the cast.
                    builder.push("(CASE WHEN jsonb_typeof(data -> ");
                    builder.push_bind(filter.field());
                    builder.push(") = 'number' THEN (data ->> ");
                    builder.push_bind(filter.field());
                    builder.push(")::NUMERIC END) ");
                    builder.push(operator);
                    builder.push(" (");
                    builder.push_bind(number.to_string());
                    builder.push(")::NUMERIC");
                }
                value => {
                    builder.push("data ->> ");
                    builder.push_bind(filter.field());
                    builder.push(' ');
                    builder.push(operator);
                    builder.push(' ');
                    builder.push_bind(value.as_str().unwrap_or_default());
                }
            }
        }
        FilterOperator::Contains => {
            builder.push("data ->> ");
            builder.push_bind(filter.field());
            builder.push(" ILIKE ");
            builder.push_bind(format!(
                "%{}%",
                escape_like(filter.value().as_str().unwrap_or_default())
            ));
        }
    }
}

/// Appends the ORDER BY clause; newest first breaks ties.
pub(super) fn push_sort<'args>(
    builder: &mut QueryBuilder<'args, Postgres>,
    sort: Option<&'args ResourceSort>,
) {
    builder.push(" ORDER BY ");

    if let Some(sort) = sort {
        builder.push("data -> ");
        builder.push_bind(sort.field());
        match sort.direction() {
            SortDirection::Asc => builder.push(" ASC NULLS LAST, "),
            SortDirection::Desc => builder.push(" DESC NULLS LAST, "),
        };
    }

    builder.push("resource_records.created_at DESC, resource_records.id");
}

fn escape_like(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
