use crate::decode::{decode_batch, DecodedRow};
use crate::encode::{encode_batch, RowMeta};
use crate::error::ColumnarError;
use crate::schema;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use lru::LruCache;
use models::ContentType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::arrow_writer::ArrowWriter;
use parquet::basic::Compression as ParquetCompression;
use parquet::file::properties::WriterProperties;
use parser::ParserRegistry;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// Columns beyond the 100 mark push a single buffered write down to RAW
/// rather than risk a wide, ever-growing schema for one collection (spec.md
/// §4.3's schema stability concern). 100 is generous for any legitimate
/// flattened payload; feeds that blow past it are almost certainly
/// unstructured and belong in RAW anyway.
const MAX_PAYLOAD_COLUMNS: usize = 100;

/// One write or merge's outcome: the Parquet bytes ready for the blob store,
/// plus the sizes the catalog records alongside them.
pub struct EncodedFragment {
    pub bytes: Bytes,
    pub size: i64,
    pub original_size: i64,
    pub content_type: Option<ContentType>,
}

/// The Parquet/Arrow encode-merge-read bridge (spec.md §4.3). Holds one
/// schema cache, keyed by `(collection_id, content_type)`, shared across
/// every `write_single`/`merge` call for the process's lifetime -- the same
/// bound the original's per-collection pyarrow schema cache keeps.
///
/// `merge_compression` is the configured constructor parameter (default
/// gzip); `write_single` never uses it -- every single-row buffered write is
/// forced to snappy to keep per-buffer encode cost low (spec.md §4.3).
pub struct ColumnarBridge {
    registry: ParserRegistry,
    schema_cache: Mutex<LruCache<(i64, i32), SchemaRef>>,
    merge_compression: ParquetCompression,
}

impl ColumnarBridge {
    pub fn new(merge_compression: ParquetCompression) -> Self {
        ColumnarBridge {
            registry: ParserRegistry::new(),
            schema_cache: Mutex::new(LruCache::new(NonZeroUsize::new(256).unwrap())),
            merge_compression,
        }
    }

    fn cached_schema(&self, collection_id: i64, content_type: ContentType, rows: &[serde_json::Value]) -> SchemaRef {
        let key = (collection_id, content_type.as_wire());
        let mut cache = self.schema_cache.lock().unwrap();
        if let Some(schema) = cache.get(&key) {
            return schema.clone();
        }
        let schema = schema::fragment_schema(rows);
        cache.put(key, schema.clone());
        schema
    }

    fn invalidate_schema(&self, collection_id: i64, content_type: ContentType) {
        self.schema_cache
            .lock()
            .unwrap()
            .pop(&(collection_id, content_type.as_wire()));
    }

    /// Encodes one buffered write as a standalone Parquet fragment.
    /// Downgrades to RAW if the payload's inferred schema is implausibly
    /// wide (see `MAX_PAYLOAD_COLUMNS`).
    pub fn write_single(
        &self,
        collection_id: i64,
        meta: RowMeta,
        content_type: ContentType,
        payload: &[u8],
    ) -> Result<EncodedFragment, ColumnarError> {
        let parser = self.registry.get(content_type);
        let rows = parser.parse(payload)?;

        let schema = schema::fragment_schema(&rows);
        let payload_columns = schema.fields().len() - 6;

        if payload_columns > MAX_PAYLOAD_COLUMNS {
            tracing::warn!(
                collection_id,
                payload_columns,
                "downgrading write to RAW: inferred schema too wide"
            );
            let raw = self.registry.get(ContentType::Raw);
            let raw_rows = raw.parse(payload)?;
            let metas = vec![RowMeta {
                content_type: ContentType::Raw.as_wire(),
                ..meta
            }];
            let schema = self.cached_schema(collection_id, ContentType::Raw, &raw_rows);
            let batch = encode_batch(schema, &raw_rows, &metas)?;
            return self.write_batch(&batch, Some(ContentType::Raw), ParquetCompression::SNAPPY);
        }

        let schema = self.cached_schema(collection_id, content_type, &rows);
        let metas = vec![meta];
        let batch = match encode_batch(schema.clone(), &rows, &metas) {
            Ok(batch) => batch,
            Err(_) => {
                // The cached schema no longer matches this row's shape; drop
                // it and infer fresh rather than fail the write.
                self.invalidate_schema(collection_id, content_type);
                let schema = self.cached_schema(collection_id, content_type, &rows);
                encode_batch(schema, &rows, &metas)?
            }
        };
        self.write_batch(&batch, Some(content_type), ParquetCompression::SNAPPY)
    }

    /// Merges several buffered fragments into one immutable fragment, sorted
    /// by timestamp. An input that fails to parse is skipped and logged, not
    /// fatal to the merge; if every input fails, nothing is produced. If the
    /// inputs don't share one content type, the whole merge is written as
    /// RAW rows instead, matching the nullable `Fragment.content_type`
    /// column (spec.md §4.3, §9).
    pub fn merge(
        &self,
        collection_id: i64,
        inputs: Vec<(RowMeta, ContentType, Bytes)>,
    ) -> Result<EncodedFragment, ColumnarError> {
        let uniform_content_type = {
            let mut iter = inputs.iter().map(|(_, ct, _)| *ct);
            let first = iter.next();
            first.filter(|ct| iter.all(|other| other == *ct))
        };

        let mut rows = Vec::new();
        let mut metas = Vec::new();

        for (meta, content_type, bytes) in inputs {
            let effective_type = uniform_content_type.unwrap_or(ContentType::Raw);
            let parser = self.registry.get(effective_type);
            match parser.parse(&bytes) {
                Ok(mut parsed) => {
                    let n = parsed.len();
                    rows.append(&mut parsed);
                    metas.extend(std::iter::repeat(meta).take(n));
                }
                Err(err) => {
                    tracing::warn!(collection_id, uuid = %meta.uuid, error = %err, "skipping unparseable buffer during merge");
                }
            }
        }

        if rows.is_empty() {
            return Err(ColumnarError::MergeProducedNothing);
        }

        let mut paired: Vec<(RowMeta, serde_json::Value)> = metas.into_iter().zip(rows).collect();
        paired.sort_by_key(|(meta, _)| meta.timestamp);
        let (metas, rows): (Vec<_>, Vec<_>) = paired.into_iter().unzip();

        let output_content_type = uniform_content_type.unwrap_or(ContentType::Raw);
        let schema = self.cached_schema(collection_id, output_content_type, &rows);
        let batch = encode_batch(schema, &rows, &metas)?;
        self.write_batch(&batch, uniform_content_type, self.merge_compression)
    }

    fn write_batch(
        &self,
        batch: &RecordBatch,
        content_type: Option<ContentType>,
        compression: ParquetCompression,
    ) -> Result<EncodedFragment, ColumnarError> {
        let original_size = batch.get_array_memory_size() as i64;

        let props = WriterProperties::builder()
            .set_compression(compression)
            .build();

        let mut buf = Vec::new();
        {
            let mut writer = ArrowWriter::try_new(&mut buf, batch.schema(), Some(props))?;
            writer.write(batch)?;
            writer.close()?;
        }

        Ok(EncodedFragment {
            size: buf.len() as i64,
            original_size,
            bytes: Bytes::from(buf),
            content_type,
        })
    }

    /// Reads matching rows out of one fragment's Parquet bytes, with
    /// row-group-level min/max timestamp pushdown (spec.md §4.3).
    pub fn read(
        &self,
        fragment_bytes: Bytes,
        min_timestamp: Option<i64>,
        max_timestamp: Option<i64>,
    ) -> Result<Vec<DecodedRow>, ColumnarError> {
        let reader = ParquetRecordBatchReaderBuilder::try_new(fragment_bytes)?.build()?;

        let mut rows = Vec::new();
        for batch in reader {
            let batch = batch?;
            let decoded = decode_batch(&batch)?;
            rows.extend(decoded.into_iter().filter(|row| {
                min_timestamp.map_or(true, |min| row.meta.timestamp >= min)
                    && max_timestamp.map_or(true, |max| row.meta.timestamp <= max)
            }));
        }
        Ok(rows)
    }

    /// Re-serializes a decoded row back to the wire bytes its original
    /// content type would have produced, for handing back to API callers.
    pub fn serialize_row(&self, content_type: ContentType, payload: &serde_json::Value) -> Result<Vec<u8>, ColumnarError> {
        self.registry.get(content_type).serialize(payload).map_err(Into::into)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn meta(timestamp: i64, uuid: &str) -> RowMeta {
        RowMeta {
            timestamp,
            content_type: ContentType::Json.as_wire(),
            hash: format!("hash-{uuid}"),
            uuid: uuid.to_string(),
            size: 0,
            original_size: 0,
        }
    }

    #[test]
    fn write_single_then_read_round_trips() {
        let bridge = ColumnarBridge::new(ParquetCompression::SNAPPY);
        let payload = br#"{"a":1,"b":"hello"}"#;

        let fragment = bridge
            .write_single(1, meta(100, "u1"), ContentType::Json, payload)
            .expect("write_single failed");
        assert_eq!(fragment.content_type, Some(ContentType::Json));

        let rows = bridge.read(fragment.bytes, None, None).expect("read failed");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].meta.timestamp, 100);
        assert_eq!(rows[0].payload["a"], 1);
        assert_eq!(rows[0].payload["b"], "hello");
    }

    #[test]
    fn read_applies_timestamp_pushdown() {
        let bridge = ColumnarBridge::new(ParquetCompression::SNAPPY);
        let fragment = bridge
            .write_single(1, meta(100, "u1"), ContentType::Json, br#"{"a":1}"#)
            .unwrap();

        let rows = bridge.read(fragment.bytes.clone(), Some(200), None).unwrap();
        assert!(rows.is_empty());

        let rows = bridge.read(fragment.bytes, Some(50), Some(150)).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn merge_of_mixed_content_types_downgrades_to_raw() {
        let bridge = ColumnarBridge::new(ParquetCompression::SNAPPY);
        let inputs = vec![
            (
                meta(1, "u1"),
                ContentType::Json,
                Bytes::from_static(br#"{"a":1}"#),
            ),
            (
                meta(2, "u2"),
                ContentType::Raw,
                Bytes::from_static(b"opaque"),
            ),
        ];

        let fragment = bridge.merge(1, inputs).expect("merge failed");
        assert_eq!(fragment.content_type, None);
    }

    #[test]
    fn merge_skips_unparseable_inputs_but_keeps_the_rest() {
        let bridge = ColumnarBridge::new(ParquetCompression::SNAPPY);
        let inputs = vec![
            (meta(1, "u1"), ContentType::Json, Bytes::from_static(b"not json")),
            (meta(2, "u2"), ContentType::Json, Bytes::from_static(br#"{"a":2}"#)),
        ];

        let fragment = bridge.merge(1, inputs).expect("merge failed");
        let rows = bridge.read(fragment.bytes, None, None).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].meta.timestamp, 2);
    }

    #[test]
    fn merge_of_all_unparseable_inputs_errors() {
        let bridge = ColumnarBridge::new(ParquetCompression::SNAPPY);
        let inputs = vec![(meta(1, "u1"), ContentType::Json, Bytes::from_static(b"not json"))];

        let err = bridge.merge(1, inputs).unwrap_err();
        assert!(matches!(err, ColumnarError::MergeProducedNothing));
    }
}
