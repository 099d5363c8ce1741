use models::Collection;
use sqlx::PgPool;

pub async fn create_collection(pool: &PgPool, name: &str) -> sqlx::Result<Collection> {
    sqlx::query_as!(
        Collection,
        r#"insert into collection (name) values ($1) returning id, name"#,
        name,
    )
    .fetch_one(pool)
    .await
}

pub async fn get_collection_by_name(pool: &PgPool, name: &str) -> sqlx::Result<Option<Collection>> {
    sqlx::query_as!(
        Collection,
        r#"select id, name from collection where name = $1"#,
        name,
    )
    .fetch_optional(pool)
    .await
}

pub async fn delete_collection(pool: &PgPool, collection_id: i64) -> sqlx::Result<()> {
    // ON DELETE CASCADE on fragment/buffered_fragment/item takes care of the
    // rest of this collection's catalog rows.
    sqlx::query!(r#"delete from collection where id = $1"#, collection_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Per-collection row/time/count stats, merged from both flushed items and
/// still-buffered writes (SPEC_FULL supplemented feature 2).
pub struct RawStats {
    pub collection_id: i64,
    pub name: String,
    pub count: i64,
    pub min_timestamp: Option<i64>,
    pub max_timestamp: Option<i64>,
}

pub async fn list_collections(pool: &PgPool) -> sqlx::Result<Vec<RawStats>> {
    sqlx::query_as!(
        RawStats,
        r#"select
            c.id as "collection_id!",
            c.name as "name!",
            (coalesce(i.count, 0) + coalesce(b.count, 0)) as "count!",
            least(i.min_timestamp, b.min_timestamp) as min_timestamp,
            greatest(i.max_timestamp, b.max_timestamp) as max_timestamp
        from collection c
        left join (
            select collection_id, count(*) as count,
                min(timestamp) as min_timestamp, max(timestamp) as max_timestamp
            from item group by collection_id
        ) i on i.collection_id = c.id
        left join (
            select collection_id, count(*) as count,
                min(timestamp) as min_timestamp, max(timestamp) as max_timestamp
            from buffered_fragment group by collection_id
        ) b on b.collection_id = c.id
        order by c.name
        "#
    )
    .fetch_all(pool)
    .await
}
