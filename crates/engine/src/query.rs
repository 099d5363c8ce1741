/// One row returned by `Engine::query` (spec.md §4.5, §4.3.3). `data` holds
/// the payload re-serialized through its content type's parser back to wire
/// bytes -- the same shape the caller originally sent -- and is `None` when
/// `skip_data` was requested, in which case only the timestamp is known.
#[derive(Debug, Clone)]
pub struct QueryRow {
    pub timestamp: i64,
    pub content_type: i32,
    pub data: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QueryOptions {
    pub min_timestamp: Option<i64>,
    pub max_timestamp: Option<i64>,
    pub ascending: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub skip_data: bool,
}
