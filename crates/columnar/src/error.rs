#[derive(Debug, thiserror::Error)]
pub enum ColumnarError {
    #[error(transparent)]
    Parse(#[from] parser::ParseError),

    #[error(transparent)]
    Arrow(#[from] arrow::error::ArrowError),

    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("advanced query failed: {0}")]
    Query(#[from] datafusion::error::DataFusionError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),

    /// Every buffered input in a `merge` call failed to parse -- there is no
    /// content left to write a fragment from (spec.md §4.3).
    #[error("all inputs to merge failed to parse, nothing to write")]
    MergeProducedNothing,
}
