use crate::schema::{
    CONTENT_TYPE_COLUMN, HASH_COLUMN, ORIGINAL_SIZE_COLUMN, SIZE_COLUMN, TIMESTAMP_COLUMN,
    UUID_COLUMN,
};
use arrow::array::{
    ArrayRef, BooleanBuilder, Float64Builder, Int32Array, Int64Array, Int64Builder, StringArray,
    StringBuilder,
};
use arrow::datatypes::{DataType, SchemaRef};
use arrow::record_batch::RecordBatch;
use serde_json::Value;
use std::sync::Arc;

/// Per-row metadata stored alongside the parsed payload (spec.md §4.4):
/// everything the catalog would otherwise need to look up to answer a
/// `read` query is denormalized into the fragment itself.
#[derive(Debug, Clone)]
pub struct RowMeta {
    pub timestamp: i64,
    pub content_type: i32,
    pub hash: String,
    pub uuid: String,
    pub size: i64,
    pub original_size: i64,
}

/// Builds a `RecordBatch` matching `schema` from `rows` and their `meta`.
/// `rows` and `meta` must have equal length; this is an internal invariant
/// of the bridge, not a caller-facing error.
pub fn encode_batch(schema: SchemaRef, rows: &[Value], meta: &[RowMeta]) -> anyhow::Result<RecordBatch> {
    debug_assert_eq!(rows.len(), meta.len());

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());
    for field in schema.fields() {
        let array: ArrayRef = match field.name().as_str() {
            TIMESTAMP_COLUMN => Arc::new(Int64Array::from_iter_values(meta.iter().map(|m| m.timestamp))),
            CONTENT_TYPE_COLUMN => Arc::new(Int32Array::from_iter_values(meta.iter().map(|m| m.content_type))),
            HASH_COLUMN => Arc::new(StringArray::from_iter_values(meta.iter().map(|m| m.hash.as_str()))),
            UUID_COLUMN => Arc::new(StringArray::from_iter_values(meta.iter().map(|m| m.uuid.as_str()))),
            SIZE_COLUMN => Arc::new(Int64Array::from_iter_values(meta.iter().map(|m| m.size))),
            ORIGINAL_SIZE_COLUMN => {
                Arc::new(Int64Array::from_iter_values(meta.iter().map(|m| m.original_size)))
            }
            name => encode_payload_column(name, field.data_type(), rows)?,
        };
        columns.push(array);
    }

    RecordBatch::try_new(schema, columns).map_err(Into::into)
}

fn encode_payload_column(name: &str, data_type: &DataType, rows: &[Value]) -> anyhow::Result<ArrayRef> {
    let values = rows.iter().map(|row| row.get(name));

    let array: ArrayRef = match data_type {
        DataType::Boolean => {
            let mut builder = BooleanBuilder::with_capacity(rows.len());
            for v in values {
                builder.append_option(v.and_then(Value::as_bool));
            }
            Arc::new(builder.finish())
        }
        DataType::Int64 => {
            let mut builder = Int64Builder::with_capacity(rows.len());
            for v in values {
                builder.append_option(v.and_then(Value::as_i64));
            }
            Arc::new(builder.finish())
        }
        DataType::Float64 => {
            let mut builder = Float64Builder::with_capacity(rows.len());
            for v in values {
                builder.append_option(v.and_then(Value::as_f64));
            }
            Arc::new(builder.finish())
        }
        DataType::Utf8 => {
            let mut builder = StringBuilder::with_capacity(rows.len(), rows.len() * 16);
            for v in values {
                match v {
                    Some(Value::String(s)) => builder.append_value(s),
                    Some(other) => builder.append_value(other.to_string()),
                    None => builder.append_null(),
                }
            }
            Arc::new(builder.finish())
        }
        other => anyhow::bail!("unsupported inferred column type: {other:?}"),
    };
    Ok(array)
}
