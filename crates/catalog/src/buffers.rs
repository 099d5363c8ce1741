use models::{BufferedFragment, ContentType};
use sqlx::{PgPool, Postgres, Transaction};

pub async fn log_buffer(
    pool: &PgPool,
    collection_id: i64,
    timestamp: i64,
    content_type: ContentType,
    size: i64,
    original_size: i64,
    uuid: uuid::Uuid,
    hash: &str,
) -> sqlx::Result<()> {
    sqlx::query!(
        r#"insert into buffered_fragment
            (collection_id, timestamp, content_type, size, original_size, uuid, locked, hash)
        values ($1, $2, $3, $4, $5, $6, false, $7)"#,
        collection_id,
        timestamp,
        content_type.as_wire(),
        size,
        original_size,
        uuid,
        hash,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Sum of `original_size` across every not-yet-locked buffer for `collection_id`, the
/// quantity `Engine::store` compares against `BUFFER_SIZE` to decide whether
/// a flush is due (spec.md §4.5).
pub async fn get_unlocked_buffers_size(pool: &PgPool, collection_id: i64) -> sqlx::Result<i64> {
    let row = sqlx::query!(
        r#"select coalesce(sum(original_size), 0) as "total!" from buffered_fragment
        where collection_id = $1 and locked = false"#,
        collection_id,
    )
    .fetch_one(pool)
    .await?;
    Ok(row.total)
}

/// Locks every unlocked buffer for `collection_id` within `txn` using
/// `FOR UPDATE SKIP LOCKED`, so two concurrent flushes of the same
/// collection never race for the same buffers (spec.md §4.4, grounded on
/// the connector-tags dequeue pattern's row locking).
pub async fn get_and_lock_buffers(
    txn: &mut Transaction<'_, Postgres>,
    collection_id: i64,
) -> sqlx::Result<Vec<BufferedFragment>> {
    let rows = sqlx::query_as!(
        BufferedFragment,
        r#"select
            collection_id,
            timestamp,
            content_type as "content_type: ContentType",
            size,
            original_size,
            uuid,
            locked,
            hash
        from buffered_fragment
        where collection_id = $1 and locked = false
        order by timestamp asc
        for update skip locked"#,
        collection_id,
    )
    .fetch_all(&mut **txn)
    .await?;

    if !rows.is_empty() {
        sqlx::query!(
            r#"update buffered_fragment set locked = true
            where collection_id = $1 and timestamp = any($2)"#,
            collection_id,
            &rows.iter().map(|r| r.timestamp).collect::<Vec<_>>(),
        )
        .execute(&mut **txn)
        .await?;
    }

    Ok(rows)
}

/// Deletes the now-merged buffers from the catalog. Called after their
/// fragment and items have been committed and their blobs removed.
pub async fn flush_buffer(
    txn: &mut Transaction<'_, Postgres>,
    collection_id: i64,
    timestamps: &[i64],
) -> sqlx::Result<()> {
    sqlx::query!(
        r#"delete from buffered_fragment where collection_id = $1 and timestamp = any($2)"#,
        collection_id,
        timestamps,
    )
    .execute(&mut **txn)
    .await?;
    Ok(())
}

/// Unlocks buffers whose merge attempt failed, so a later flush retries
/// them instead of leaving them stuck locked forever.
pub async fn flush_skipped_buffers(
    pool: &PgPool,
    collection_id: i64,
    timestamps: &[i64],
) -> sqlx::Result<()> {
    sqlx::query!(
        r#"update buffered_fragment set locked = false
        where collection_id = $1 and timestamp = any($2)"#,
        collection_id,
        timestamps,
    )
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn query_buffers(
    pool: &PgPool,
    collection_id: i64,
    min_timestamp: Option<i64>,
    max_timestamp: Option<i64>,
) -> sqlx::Result<Vec<BufferedFragment>> {
    sqlx::query_as!(
        BufferedFragment,
        r#"select
            collection_id,
            timestamp,
            content_type as "content_type: ContentType",
            size,
            original_size,
            uuid,
            locked,
            hash
        from buffered_fragment
        where collection_id = $1
            and ($2::bigint is null or timestamp >= $2)
            and ($3::bigint is null or timestamp <= $3)
        order by timestamp asc"#,
        collection_id,
        min_timestamp,
        max_timestamp,
    )
    .fetch_all(pool)
    .await
}
