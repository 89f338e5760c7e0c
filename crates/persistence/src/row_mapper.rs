use log::{debug, error};
use serde_json::Value as JsonValue;
use sqlx::{postgres::PgRow, Column, Row as SqlxRow};

use tenant_bench_core::domain::diff::Row;

fn extract_integer_field(row: &PgRow, column_name: &str, is_bigint: bool) -> JsonValue {
    if is_bigint {
        row.try_get::<Option<i64>, _>(column_name).map_or_else(
            |_| JsonValue::Null,
            |value| value.map_or(JsonValue::Null, |v| JsonValue::Number(v.into())),
        )
    } else {
        row.try_get::<Option<i32>, _>(column_name).map_or_else(
            |_| JsonValue::Null,
            |value| value.map_or(JsonValue::Null, |v| JsonValue::Number(v.into())),
        )
    }
}

fn extract_float_field(row: &PgRow, column_name: &str) -> JsonValue {
    row.try_get::<Option<f64>, _>(column_name).map_or_else(
        |_| JsonValue::Null,
        |value| {
            value
                .and_then(|v| serde_json::Number::from_f64(v).map(JsonValue::Number))
                .unwrap_or(JsonValue::Null)
        },
    )
}

fn extract_boolean_field(row: &PgRow, column_name: &str) -> JsonValue {
    row.try_get::<Option<bool>, _>(column_name)
        .map_or(JsonValue::Null, |value| {
            value.map_or(JsonValue::Null, JsonValue::Bool)
        })
}

fn extract_text_field(row: &PgRow, column_name: &str) -> JsonValue {
    row.try_get::<Option<String>, _>(column_name)
        .map_or(JsonValue::Null, |value| {
            value.map_or(JsonValue::Null, JsonValue::String)
        })
}

fn extract_uuid_field(row: &PgRow, column_name: &str) -> JsonValue {
    row.try_get::<Option<uuid::Uuid>, _>(column_name)
        .map_or(JsonValue::Null, |value| {
            value.map_or(JsonValue::Null, |v| JsonValue::String(v.to_string()))
        })
}

fn extract_timestamp_field(row: &PgRow, column_name: &str) -> JsonValue {
    row.try_get::<Option<time::OffsetDateTime>, _>(column_name)
        .map_or(JsonValue::Null, |value| {
            value
                .and_then(|v| {
                    v.format(&time::format_description::well_known::Rfc3339)
                        .ok()
                        .map(JsonValue::String)
                })
                .unwrap_or(JsonValue::Null)
        })
}

fn extract_date_field(row: &PgRow, column_name: &str) -> JsonValue {
    row.try_get::<Option<time::Date>, _>(column_name)
        .map_or(JsonValue::Null, |value| {
            value.map_or(JsonValue::Null, |v| JsonValue::String(v.to_string()))
        })
}

fn extract_json_field(row: &PgRow, column_name: &str) -> JsonValue {
    row.try_get::<Option<JsonValue>, _>(column_name)
        .map_or(JsonValue::Null, |value| value.unwrap_or(JsonValue::Null))
}

/// Flatten a `PgRow` into a tagged-value map by dispatching on the
/// Postgres type name, the way every table-agnostic Differ query needs its
/// rows represented regardless of the tenant schema's actual shape.
#[must_use]
pub fn extract_field_data(row: &PgRow) -> Row {
    let mut field_data = Row::new();

    for column in row.columns() {
        let column_name = column.name();
        let column_type = column.type_info().to_string();

        let value = match column_type.to_lowercase().as_str() {
            "int4" | "int2" => extract_integer_field(row, column_name, false),
            "int8" => extract_integer_field(row, column_name, true),
            "float4" | "float8" | "numeric" => extract_float_field(row, column_name),
            "bool" => extract_boolean_field(row, column_name),
            "text" | "varchar" | "char" | "name" => extract_text_field(row, column_name),
            "uuid" => extract_uuid_field(row, column_name),
            "timestamp" | "timestamptz" => extract_timestamp_field(row, column_name),
            "date" => extract_date_field(row, column_name),
            "json" | "jsonb" => extract_json_field(row, column_name),
            other => {
                error!("unsupported type extraction for column '{column_name}' of type '{other}'");
                JsonValue::Null
            }
        };

        debug!("column '{column_name}' of type '{column_type}' -> {value:?}");
        field_data.insert(column_name.to_string(), value);
    }

    field_data
}
