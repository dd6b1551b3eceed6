//! Authentication extractor.
//!
//! Every `/api` route except user sync takes an [`AuthUser`]. The raw init
//! data travels in the `X-Telegram-Auth` header: a missing header is a 401,
//! init data that fails verification a 403.

use axum::{extract::FromRequestParts, http::request::Parts};
use dream_engine::AUTH_HEADER;

use super::TelegramUser;
use crate::error::AppError;
use crate::AppState;

/// Authenticated Telegram user extracted from the request.
#[derive(Debug, Clone)]
pub struct AuthUser(pub TelegramUser);

impl AuthUser {
    pub fn id(&self) -> i64 {
        self.0.id
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let init_data = parts
            .headers
            .get(AUTH_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

        authenticate(state, init_data).map(AuthUser)
    }
}

/// Verify raw init data against the configured bot token.
pub(crate) fn authenticate(state: &AppState, init_data: &str) -> Result<TelegramUser, AppError> {
    let now = chrono::Utc::now().timestamp();
    state.validator.validate(init_data, now).map_err(|e| {
        tracing::debug!(error = %e, "init data rejected");
        AppError::Forbidden("Invalid authentication".to_string())
    })
}
