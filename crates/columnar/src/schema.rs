//! Infers an Arrow schema from a batch of parsed JSON records, the Rust
//! analog of the original bridge's `pyarrow.Table.from_pylist` schema
//! inference. Only scalar JSON types map to a dedicated Arrow column type;
//! arrays, nested objects, and fields whose type is inconsistent across rows
//! fall back to a JSON-encoded Utf8 column, which keeps `write_single`'s
//! single-row inference total rather than partial.
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const TIMESTAMP_COLUMN: &str = "__timestamp";
pub const CONTENT_TYPE_COLUMN: &str = "__content_type";
pub const HASH_COLUMN: &str = "__hash";
pub const UUID_COLUMN: &str = "__uuid";
pub const SIZE_COLUMN: &str = "__size";
pub const ORIGINAL_SIZE_COLUMN: &str = "__original_size";

/// Builds the full schema for a fragment: the fixed metadata columns spec.md
/// §4.4's catalog mirrors, followed by the payload columns inferred from
/// `rows`.
pub fn fragment_schema(rows: &[Value]) -> SchemaRef {
    let mut fields = vec![
        Field::new(TIMESTAMP_COLUMN, DataType::Int64, false),
        Field::new(CONTENT_TYPE_COLUMN, DataType::Int32, false),
        Field::new(HASH_COLUMN, DataType::Utf8, false),
        Field::new(UUID_COLUMN, DataType::Utf8, false),
        Field::new(SIZE_COLUMN, DataType::Int64, false),
        Field::new(ORIGINAL_SIZE_COLUMN, DataType::Int64, false),
    ];
    fields.extend(infer_payload_fields(rows));
    Arc::new(Schema::new(fields))
}

fn infer_payload_fields(rows: &[Value]) -> Vec<Field> {
    let mut types: BTreeMap<String, DataType> = BTreeMap::new();
    for row in rows {
        let Value::Object(map) = row else { continue };
        for (key, value) in map {
            let inferred = infer_scalar_type(value);
            types
                .entry(key.clone())
                .and_modify(|existing| *existing = unify(existing, &inferred))
                .or_insert(inferred);
        }
    }
    types
        .into_iter()
        .map(|(name, data_type)| Field::new(name, data_type, true))
        .collect()
}

fn infer_scalar_type(value: &Value) -> DataType {
    match value {
        Value::Null => DataType::Utf8,
        Value::Bool(_) => DataType::Boolean,
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                DataType::Int64
            } else {
                DataType::Float64
            }
        }
        Value::String(_) => DataType::Utf8,
        Value::Array(_) | Value::Object(_) => DataType::Utf8,
    }
}

/// Reconciles two inferred types for the same column across rows. Anything
/// other than an exact match (including numeric widening) downgrades to
/// Utf8 -- payload columns are for convenience, the original JSON is always
/// recoverable through the parser's own `serialize`.
fn unify(a: &DataType, b: &DataType) -> DataType {
    if a == b {
        a.clone()
    } else {
        DataType::Utf8
    }
}
