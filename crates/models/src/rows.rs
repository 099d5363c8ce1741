use crate::content_type::ContentType;

/// A named, independently-addressable stream of data (spec.md §3).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Collection {
    pub id: i64,
    pub name: String,
}

/// A merged, immutable Parquet object already flushed to the blob store.
/// `content_type` is nullable: a fragment produced by `merge` can span
/// buffers of mixed content types, in which case the columnar bridge
/// downgrades the merge to RAW and this column is left unset (spec.md §4.3).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Fragment {
    pub uuid: uuid::Uuid,
    pub collection_id: i64,
    pub content_type: Option<ContentType>,
}

/// A single unflushed write, still held as its own blob-store object keyed
/// by `uuid`. Primary key is `(collection_id, timestamp)` per spec.md §9;
/// `uuid` carries a separate unique index since it is the blob store key.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BufferedFragment {
    pub collection_id: i64,
    pub timestamp: i64,
    pub content_type: ContentType,
    pub size: i64,
    pub original_size: i64,
    pub uuid: uuid::Uuid,
    pub locked: bool,
    pub hash: String,
}

/// One logical write as it appears inside a merged `Fragment`. Rows are
/// reconstructed at query time by reading the fragment's Parquet file, never
/// persisted as their own blob objects.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Item {
    pub fragment_id: uuid::Uuid,
    pub collection_id: i64,
    pub timestamp: i64,
    pub size: i64,
    pub original_size: i64,
    pub content_type: ContentType,
    pub hash: String,
}

/// Aggregate stats returned by `list_collections` (spec.md §4.4), merged
/// across both `Item` and `BufferedFragment` rows for a collection: overall
/// min/max timestamp and total count.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct CollectionStats {
    pub count: i64,
    pub min_timestamp: Option<i64>,
    pub max_timestamp: Option<i64>,
}

impl CollectionStats {
    pub fn merge(self, other: Self) -> Self {
        CollectionStats {
            count: self.count + other.count,
            min_timestamp: min_opt(self.min_timestamp, other.min_timestamp),
            max_timestamp: max_opt(self.max_timestamp, other.max_timestamp),
        }
    }
}

fn min_opt(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

fn max_opt(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}
