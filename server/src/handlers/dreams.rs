//! Dream CRUD handlers.

use crate::auth::TelegramUser;
use crate::db::{self, DreamFilter, StoredDream};
use crate::error::{AppError, Result};
use dream_engine::{
    DeleteResponse, Dream, DreamEnvelope, DreamId, DreamInput, DreamPatch, DreamsResponse, ListQuery,
};
use sqlx::PgPool;

/// List a page of the user's dreams.
pub async fn handle_list_dreams(
    pool: &PgPool,
    user_id: i64,
    query: ListQuery,
) -> Result<DreamsResponse> {
    let filter = DreamFilter::from_query(&query)?;
    let rows = db::list_dreams(pool, user_id, &filter).await?;

    let mut dreams = Vec::with_capacity(rows.len());
    for row in rows {
        let id = row.id;
        match row.into_dream() {
            Ok(dream) => dreams.push(dream),
            Err(e) => {
                tracing::warn!("Failed to convert stored dream {}: {}", id, e);
                // Skip invalid rows
            }
        }
    }

    Ok(DreamsResponse { dreams })
}

pub async fn handle_get_dream(
    pool: &PgPool,
    user_id: i64,
    id: DreamId,
) -> Result<DreamEnvelope<Dream>> {
    let row = db::get_dream(pool, user_id, id).await?;
    found(row, id)
}

/// Store a new dream. The user row is upserted in the same transaction so
/// a first save works even if the client never called user sync.
pub async fn handle_create_dream(
    pool: &PgPool,
    user: &TelegramUser,
    input: DreamInput,
) -> Result<DreamEnvelope<Dream>> {
    let input = input.prepared()?;

    let mut tx = pool.begin().await?;
    db::upsert_user(&mut *tx, user).await?;
    let row = db::insert_dream(&mut *tx, user.id, &input).await?;
    tx.commit().await?;

    tracing::debug!(user_id = user.id, id = row.id, "dream created");

    Ok(DreamEnvelope {
        dream: row.into_dream()?,
    })
}

pub async fn handle_update_dream(
    pool: &PgPool,
    user_id: i64,
    id: DreamId,
    patch: DreamPatch,
) -> Result<DreamEnvelope<Dream>> {
    let row = db::update_dream(pool, user_id, id, &patch).await?;
    found(row, id)
}

pub async fn handle_delete_dream(
    pool: &PgPool,
    user_id: i64,
    id: DreamId,
) -> Result<DeleteResponse> {
    if !db::delete_dream(pool, user_id, id).await? {
        return Err(not_found(id));
    }
    tracing::debug!(user_id, id, "dream deleted");
    Ok(DeleteResponse { deleted: id })
}

fn found(row: Option<StoredDream>, id: DreamId) -> Result<DreamEnvelope<Dream>> {
    let row = row.ok_or_else(|| not_found(id))?;
    Ok(DreamEnvelope {
        dream: row.into_dream()?,
    })
}

fn not_found(id: DreamId) -> AppError {
    AppError::NotFound(format!("Dream {} not found", id))
}
