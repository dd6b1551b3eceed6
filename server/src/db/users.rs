//! Database operations for the users table.

use crate::auth::TelegramUser;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::{PgExecutor, PgRow};
use sqlx::Row;

/// A user row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUser {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub language_code: Option<String>,
    #[serde(serialize_with = "chrono::serde::ts_milliseconds::serialize")]
    pub created_at: DateTime<Utc>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for StoredUser {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(StoredUser {
            id: row.try_get("id")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            username: row.try_get("username")?,
            language_code: row.try_get("language_code")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Insert the user or refresh their profile fields.
pub async fn upsert_user<'e, E>(executor: E, user: &TelegramUser) -> Result<StoredUser, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, StoredUser>(
        r#"
        INSERT INTO users (id, first_name, last_name, username, language_code)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (id) DO UPDATE SET
            first_name = EXCLUDED.first_name,
            last_name = EXCLUDED.last_name,
            username = EXCLUDED.username,
            language_code = EXCLUDED.language_code
        RETURNING id, first_name, last_name, username, language_code, created_at
        "#,
    )
    .bind(user.id)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.username)
    .bind(&user.language_code)
    .fetch_one(executor)
    .await
}
