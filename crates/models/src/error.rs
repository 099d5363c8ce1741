/// Expected faults surfaced to the API caller (spec.md §7). Every variant
/// maps to HTTP 400 at the API boundary -- the status code never varies, only
/// the message, so the HTTP mapping lives in `api` rather than here.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("collection '{0}' does not exist")]
    UnknownCollection(String),

    #[error("collection '{0}' already exists")]
    CollectionExists(String),

    #[error("Max difference between timestamps is 7 day")]
    RangeTooWide,

    #[error("query failed: {0}")]
    QueryFailed(String),

    #[error("cannot store raw data: {0}")]
    Unparseable(String),

    #[error("duplicate buffered fragment for collection '{collection}' at timestamp {timestamp}")]
    DuplicateBuffer { collection: String, timestamp: i64 },

    #[error(transparent)]
    Catalog(#[from] sqlx::Error),

    #[error(transparent)]
    BlobStore(#[from] anyhow::Error),
}

/// Programmer errors (spec.md §7): invalid arguments that indicate a bug in
/// the caller, never the result of external state. Never logged at ERROR
/// level.
#[derive(Debug, thiserror::Error)]
pub enum Invariant {
    #[error("invalid blob key '{0}': must match [A-Za-z0-9_-]+")]
    InvalidBlobKey(String),
}
