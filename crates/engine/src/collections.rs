use catalog::RawStats;
use serde::Serialize;

/// Per-collection aggregate returned by `GET /collections/` (spec.md §4.4,
/// §6): min/max timestamp and row count, merged across committed items and
/// still-unflushed buffers.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionSummary {
    pub name: String,
    pub min_timestamp: Option<i64>,
    pub max_timestamp: Option<i64>,
    pub count: i64,
}

impl From<RawStats> for CollectionSummary {
    fn from(stats: RawStats) -> Self {
        CollectionSummary {
            name: stats.name,
            min_timestamp: stats.min_timestamp,
            max_timestamp: stats.max_timestamp,
            count: stats.count,
        }
    }
}
