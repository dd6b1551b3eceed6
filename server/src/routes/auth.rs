//! User sync route.

use axum::{extract::State, routing::post, Json, Router};

use crate::auth::authenticate;
use crate::error::{AppError, Result};
use crate::handlers::{handle_sync_user, SyncUserRequest, SyncUserResponse};
use crate::AppState;

/// Create auth routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/auth/sync", post(sync_handler))
}

/// POST /api/auth/sync - Verify init data from the body and upsert the user.
async fn sync_handler(
    State(state): State<AppState>,
    Json(request): Json<SyncUserRequest>,
) -> Result<Json<SyncUserResponse>> {
    let init_data = request.init_data.trim();
    if init_data.is_empty() {
        return Err(AppError::BadRequest("initData is required".to_string()));
    }

    let user = authenticate(&state, init_data)?;
    let response = handle_sync_user(&state.pool, &user).await?;
    Ok(Json(response))
}
