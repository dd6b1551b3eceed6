//! User sync handler.

use crate::auth::TelegramUser;
use crate::db::{self, StoredUser};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Request body for user sync.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncUserRequest {
    #[serde(default)]
    pub init_data: String,
}

/// Response for user sync.
#[derive(Debug, Serialize)]
pub struct SyncUserResponse {
    pub user: StoredUser,
}

/// Record the verified Telegram user.
pub async fn handle_sync_user(pool: &PgPool, user: &TelegramUser) -> Result<SyncUserResponse> {
    let user = db::upsert_user(pool, user).await?;
    tracing::info!(user_id = user.id, "user synced");
    Ok(SyncUserResponse { user })
}
