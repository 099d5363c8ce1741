use crate::encode::RowMeta;
use crate::schema::{
    CONTENT_TYPE_COLUMN, HASH_COLUMN, ORIGINAL_SIZE_COLUMN, SIZE_COLUMN, TIMESTAMP_COLUMN,
    UUID_COLUMN,
};
use arrow::array::{Array, BooleanArray, Float64Array, Int32Array, Int64Array, StringArray};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use serde_json::{Map, Value};

/// One row of a fragment as read back: its metadata plus the reconstructed
/// JSON payload of its non-metadata columns.
pub struct DecodedRow {
    pub meta: RowMeta,
    pub payload: Value,
}

pub fn decode_batch(batch: &RecordBatch) -> anyhow::Result<Vec<DecodedRow>> {
    let schema = batch.schema();
    let num_rows = batch.num_rows();

    let timestamp = column_as::<Int64Array>(batch, TIMESTAMP_COLUMN)?;
    let content_type = column_as::<Int32Array>(batch, CONTENT_TYPE_COLUMN)?;
    let hash = column_as::<StringArray>(batch, HASH_COLUMN)?;
    let uuid = column_as::<StringArray>(batch, UUID_COLUMN)?;
    let size = column_as::<Int64Array>(batch, SIZE_COLUMN)?;
    let original_size = column_as::<Int64Array>(batch, ORIGINAL_SIZE_COLUMN)?;

    let payload_fields: Vec<usize> = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, f)| {
            !matches!(
                f.name().as_str(),
                TIMESTAMP_COLUMN
                    | CONTENT_TYPE_COLUMN
                    | HASH_COLUMN
                    | UUID_COLUMN
                    | SIZE_COLUMN
                    | ORIGINAL_SIZE_COLUMN
            )
        })
        .map(|(i, _)| i)
        .collect();

    let mut rows = Vec::with_capacity(num_rows);
    for row_idx in 0..num_rows {
        let mut payload = Map::new();
        for &col_idx in &payload_fields {
            let field = schema.field(col_idx);
            let column = batch.column(col_idx);
            if column.is_null(row_idx) {
                continue;
            }
            let value = match field.data_type() {
                DataType::Boolean => Value::Bool(
                    column
                        .as_any()
                        .downcast_ref::<BooleanArray>()
                        .unwrap()
                        .value(row_idx),
                ),
                DataType::Int64 => Value::from(
                    column
                        .as_any()
                        .downcast_ref::<Int64Array>()
                        .unwrap()
                        .value(row_idx),
                ),
                DataType::Float64 => Value::from(
                    column
                        .as_any()
                        .downcast_ref::<Float64Array>()
                        .unwrap()
                        .value(row_idx),
                ),
                DataType::Utf8 => Value::String(
                    column
                        .as_any()
                        .downcast_ref::<StringArray>()
                        .unwrap()
                        .value(row_idx)
                        .to_string(),
                ),
                other => anyhow::bail!("unsupported column type at read time: {other:?}"),
            };
            payload.insert(field.name().clone(), value);
        }

        rows.push(DecodedRow {
            meta: RowMeta {
                timestamp: timestamp.value(row_idx),
                content_type: content_type.value(row_idx),
                hash: hash.value(row_idx).to_string(),
                uuid: uuid.value(row_idx).to_string(),
                size: size.value(row_idx),
                original_size: original_size.value(row_idx),
            },
            payload: Value::Object(payload),
        });
    }

    Ok(rows)
}

fn column_as<'a, T: Array + 'static>(batch: &'a RecordBatch, name: &str) -> anyhow::Result<&'a T> {
    batch
        .column_by_name(name)
        .ok_or_else(|| anyhow::anyhow!("missing column '{name}'"))?
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| anyhow::anyhow!("column '{name}' has unexpected type"))
}
