//! Federated SQL over a collection's fragments, the Rust analog of the
//! original bridge's DuckDB `read_parquet([...], union_by_name=true)` call.
//! DataFusion's `ListingTable` infers a schema across all paths and unions
//! differing fragment schemas by name, which is exactly the property
//! `union_by_name=true` names.
use crate::error::ColumnarError;
use datafusion::datasource::file_format::parquet::ParquetFormat;
use datafusion::datasource::listing::{
    ListingOptions, ListingTable, ListingTableConfig, ListingTableUrl,
};
use datafusion::prelude::SessionContext;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Runs `sql` against the union of the Parquet files at `fragment_paths`,
/// substituting the literal token `[table]` with the registered table name
/// (spec.md §4.3, §9: passed through untrusted, no further sanitization).
pub async fn advanced_query(
    fragment_paths: &[String],
    sql: &str,
) -> Result<Vec<Value>, ColumnarError> {
    const TABLE_NAME: &str = "collection";

    let ctx = SessionContext::new();

    let table_urls = fragment_paths
        .iter()
        .map(|p| ListingTableUrl::parse(p))
        .collect::<Result<Vec<_>, _>>()?;

    let listing_options = ListingOptions::new(Arc::new(ParquetFormat::default()));
    let config = ListingTableConfig::new_with_multi_paths(table_urls)
        .with_listing_options(listing_options);
    let config = config.infer_schema(&ctx.state()).await?;
    let table = ListingTable::try_new(config)?;
    ctx.register_table(TABLE_NAME, Arc::new(table))?;

    let resolved_sql = sql.replace("[table]", TABLE_NAME);
    let df = ctx.sql(&resolved_sql).await?;
    let batches = df.collect().await?;

    let mut rows = Vec::new();
    for batch in &batches {
        rows.extend(batch_to_values(batch)?);
    }
    Ok(rows)
}

fn batch_to_values(batch: &datafusion::arrow::record_batch::RecordBatch) -> Result<Vec<Value>, ColumnarError> {
    let json_rows: Vec<Map<String, Value>> =
        datafusion::arrow::json::writer::record_batches_to_json_rows(&[batch])?;
    Ok(json_rows.into_iter().map(Value::Object).collect())
}
