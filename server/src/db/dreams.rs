//! Database operations for the dreams table.
//!
//! Every query is scoped by `user_id`; a dream owned by someone else is
//! indistinguishable from one that does not exist.

use crate::error::AppError;
use chrono::{DateTime, Utc};
use dream_engine::{Dream, DreamId, DreamInput, DreamPatch, DreamType, ListQuery, Timestamp};
use sqlx::postgres::{PgExecutor, PgRow};
use sqlx::{PgPool, Row};

/// A stored dream row from the database.
#[derive(Debug)]
pub struct StoredDream {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub date: Option<i64>,
    pub tags: Vec<String>,
    pub dream_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for StoredDream {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(StoredDream {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            content: row.try_get("content")?,
            date: row.try_get("date")?,
            tags: row.try_get("tags")?,
            dream_type: row.try_get("type")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

impl StoredDream {
    /// Convert database row to the engine's Dream.
    ///
    /// A row the schema should never have let in is a server fault.
    pub fn into_dream(self) -> Result<Dream, AppError> {
        let dream_type = self.dream_type.parse().map_err(|e| {
            AppError::Internal(format!("stored dream {} is corrupt: {}", self.id, e))
        })?;
        Ok(Dream {
            id: self.id,
            title: self.title,
            content: self.content,
            date: self.date,
            tags: self.tags,
            dream_type,
            created_at: self.created_at.timestamp_millis(),
            updated_at: self.updated_at.timestamp_millis(),
        })
    }
}

/// Filters for [`list_dreams`], already validated.
#[derive(Debug, Default)]
pub struct DreamFilter {
    pub dream_type: Option<DreamType>,
    /// Escaped `ILIKE` pattern.
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl DreamFilter {
    pub fn from_query(query: &ListQuery) -> Result<Self, dream_engine::Error> {
        Ok(Self {
            dream_type: query.type_filter()?,
            search: query.search_pattern(),
            limit: query.limit(),
            offset: query.offset(),
        })
    }
}

/// A page of a user's dreams, newest date first, undated last.
pub async fn list_dreams(
    pool: &PgPool,
    user_id: i64,
    filter: &DreamFilter,
) -> Result<Vec<StoredDream>, sqlx::Error> {
    sqlx::query_as::<_, StoredDream>(
        r#"
        SELECT id, title, content, date, tags, type, created_at, updated_at
        FROM dreams
        WHERE user_id = $1
          AND ($2::text IS NULL OR type = $2)
          AND (
            $3::text IS NULL
            OR title ILIKE $3
            OR content ILIKE $3
            OR EXISTS (SELECT 1 FROM unnest(tags) AS tag WHERE tag ILIKE $3)
          )
        ORDER BY date DESC NULLS LAST, created_at DESC, id DESC
        LIMIT $4 OFFSET $5
        "#,
    )
    .bind(user_id)
    .bind(filter.dream_type.map(|t| t.as_str()))
    .bind(filter.search.as_deref())
    .bind(filter.limit)
    .bind(filter.offset)
    .fetch_all(pool)
    .await
}

/// Get one of a user's dreams.
pub async fn get_dream(
    pool: &PgPool,
    user_id: i64,
    id: DreamId,
) -> Result<Option<StoredDream>, sqlx::Error> {
    sqlx::query_as::<_, StoredDream>(
        r#"
        SELECT id, title, content, date, tags, type, created_at, updated_at
        FROM dreams
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Insert a dream for a user. `input` must already be validated.
pub async fn insert_dream<'e, E>(
    executor: E,
    user_id: i64,
    input: &DreamInput,
) -> Result<StoredDream, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, StoredDream>(
        r#"
        INSERT INTO dreams (user_id, title, content, date, tags, type)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, title, content, date, tags, type, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(&input.title)
    .bind(&input.content)
    .bind(input.date)
    .bind(&input.tags)
    .bind(input.dream_type.as_str())
    .fetch_one(executor)
    .await
}

/// Apply a patch to one of a user's dreams.
///
/// The row is locked, merged with the patch the same way the client merges
/// it, validated, and written back. Returns `None` when the user has no
/// dream with that id.
pub async fn update_dream(
    pool: &PgPool,
    user_id: i64,
    id: DreamId,
    patch: &DreamPatch,
) -> crate::error::Result<Option<StoredDream>> {
    let mut tx = pool.begin().await?;

    let current = sqlx::query_as::<_, StoredDream>(
        r#"
        SELECT id, title, content, date, tags, type, created_at, updated_at
        FROM dreams
        WHERE id = $1 AND user_id = $2
        FOR UPDATE
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(current) = current else {
        return Ok(None);
    };

    let merged = current.into_dream()?.merged(patch);
    merged.validate()?;

    let updated = sqlx::query_as::<_, StoredDream>(
        r#"
        UPDATE dreams
        SET title = $3, content = $4, date = $5, tags = $6, type = $7
        WHERE id = $1 AND user_id = $2
        RETURNING id, title, content, date, tags, type, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(&merged.title)
    .bind(&merged.content)
    .bind(merged.date)
    .bind(&merged.tags)
    .bind(merged.dream_type.as_str())
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(Some(updated))
}

/// Delete one of a user's dreams. Returns whether a row was removed.
pub async fn delete_dream(
    pool: &PgPool,
    user_id: i64,
    id: DreamId,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM dreams WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Every distinct tag a user has used, sorted.
pub async fn list_unique_tags(
    pool: &PgPool,
    user_id: i64,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        SELECT DISTINCT unnest(tags) AS tag
        FROM dreams
        WHERE user_id = $1
        ORDER BY tag
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Bounds for [`stats_entries`]. Dreams without a date always pass the
/// date bounds.
#[derive(Debug, Default)]
pub struct StatsFilter {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
    pub dream_type: Option<DreamType>,
}

/// `(type, tags)` of every dream of a user inside the filter.
pub async fn stats_entries(
    pool: &PgPool,
    user_id: i64,
    filter: &StatsFilter,
) -> Result<Vec<(String, Vec<String>)>, sqlx::Error> {
    sqlx::query_as::<_, (String, Vec<String>)>(
        r#"
        SELECT type, tags
        FROM dreams
        WHERE user_id = $1
          AND ($2::bigint IS NULL OR date IS NULL OR date >= $2)
          AND ($3::bigint IS NULL OR date IS NULL OR date <= $3)
          AND ($4::text IS NULL OR type = $4)
        "#,
    )
    .bind(user_id)
    .bind(filter.start)
    .bind(filter.end)
    .bind(filter.dream_type.map(|t| t.as_str()))
    .fetch_all(pool)
    .await
}
