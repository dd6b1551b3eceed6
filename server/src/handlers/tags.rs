//! Tag vocabulary handler.

use crate::db;
use crate::error::Result;
use dream_engine::TagsResponse;
use sqlx::PgPool;

pub async fn handle_list_tags(pool: &PgPool, user_id: i64) -> Result<TagsResponse> {
    let tags = db::list_unique_tags(pool, user_id).await?;
    Ok(TagsResponse { tags })
}
