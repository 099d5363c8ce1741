pub use models::{DomainError, Invariant};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Invariant(#[from] Invariant),

    #[error(transparent)]
    Columnar(#[from] columnar::ColumnarError),

    #[error(transparent)]
    Catalog(#[from] sqlx::Error),

    #[error(transparent)]
    BlobStore(#[from] anyhow::Error),
}
