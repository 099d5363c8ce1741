use models::{ContentType, Item};
use sqlx::{PgPool, Postgres, Transaction};

/// Records a newly-written fragment and the items it now represents,
/// atomically with the buffers it replaces being deleted (spec.md §4.4's
/// flush transaction). `content_type` is `None` when `merge` downgraded a
/// mixed-content-type fragment to RAW (spec.md §9).
pub async fn insert_fragment(
    txn: &mut Transaction<'_, Postgres>,
    fragment_id: uuid::Uuid,
    collection_id: i64,
    content_type: Option<ContentType>,
) -> sqlx::Result<()> {
    sqlx::query!(
        r#"insert into fragment (uuid, collection_id, content_type) values ($1, $2, $3)"#,
        fragment_id,
        collection_id,
        content_type.map(ContentType::as_wire),
    )
    .execute(&mut **txn)
    .await?;
    Ok(())
}

pub struct NewItem {
    pub timestamp: i64,
    pub size: i64,
    pub original_size: i64,
    pub content_type: ContentType,
    pub hash: String,
}

pub async fn insert_items(
    txn: &mut Transaction<'_, Postgres>,
    fragment_id: uuid::Uuid,
    collection_id: i64,
    items: &[NewItem],
) -> sqlx::Result<()> {
    for item in items {
        sqlx::query!(
            r#"insert into item
                (fragment_id, collection_id, timestamp, size, original_size, content_type, hash)
            values ($1, $2, $3, $4, $5, $6, $7)"#,
            fragment_id,
            collection_id,
            item.timestamp,
            item.size,
            item.original_size,
            item.content_type.as_wire(),
            item.hash,
        )
        .execute(&mut **txn)
        .await?;
    }
    Ok(())
}

/// Item metadata matching a range query, ordered and paginated at the SQL
/// level (spec.md §4.4) -- the payload itself is read back from the
/// fragment's Parquet blob by the engine, keyed by `fragment_id`. An optional
/// `content_types` filter narrows to the owning fragment's content type,
/// used by `Engine::advanced_query` to only consider JSON/GTFS-RT fragments
/// (spec.md §4.5.4).
pub async fn query_items(
    pool: &PgPool,
    collection_id: i64,
    min_timestamp: Option<i64>,
    max_timestamp: Option<i64>,
    limit: Option<i64>,
    offset: Option<i64>,
    content_types: Option<&[ContentType]>,
) -> sqlx::Result<Vec<Item>> {
    let content_type_wires = content_types.map(|types| types.iter().map(|t| t.as_wire()).collect::<Vec<_>>());
    sqlx::query_as!(
        Item,
        r#"select
            fragment_id,
            collection_id,
            timestamp,
            size,
            original_size,
            content_type as "content_type: ContentType",
            hash
        from item
        where collection_id = $1
            and ($2::bigint is null or timestamp >= $2)
            and ($3::bigint is null or timestamp <= $3)
            and ($6::integer[] is null or content_type = any($6))
        order by timestamp asc
        limit $4
        offset coalesce($5, 0)"#,
        collection_id,
        min_timestamp,
        max_timestamp,
        limit,
        offset,
        content_type_wires.as_deref(),
    )
    .fetch_all(pool)
    .await
}

/// All items belonging to a single fragment, e.g. for recomputing that
/// fragment's blob-store path set during `advanced_query`.
pub async fn get_items_from_fragments(
    pool: &PgPool,
    fragment_ids: &[uuid::Uuid],
) -> sqlx::Result<Vec<Item>> {
    sqlx::query_as!(
        Item,
        r#"select
            fragment_id,
            collection_id,
            timestamp,
            size,
            original_size,
            content_type as "content_type: ContentType",
            hash
        from item
        where fragment_id = any($1)
        order by timestamp asc"#,
        fragment_ids,
    )
    .fetch_all(pool)
    .await
}

/// Distinct fragment uuids for a collection, used to build the blob-store
/// path list `columnar::advanced_query` federates over.
pub async fn list_fragment_uuids(pool: &PgPool, collection_id: i64) -> sqlx::Result<Vec<uuid::Uuid>> {
    let rows = sqlx::query!(
        r#"select uuid from fragment where collection_id = $1"#,
        collection_id,
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|r| r.uuid).collect())
}
