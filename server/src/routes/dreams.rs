//! Dream, tag and stats routes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use dream_engine::{
    DeleteResponse, Dream, DreamEnvelope, DreamId, DreamInput, DreamPatch, DreamsResponse,
    ListQuery, StatsQuery, StatsResponse, TagsResponse,
};

use crate::auth::AuthUser;
use crate::error::Result;
use crate::handlers::{
    handle_create_dream, handle_delete_dream, handle_get_dream, handle_list_dreams,
    handle_list_tags, handle_stats, handle_update_dream,
};
use crate::AppState;

/// Create dream routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/dreams", get(list_handler).post(create_handler))
        .route(
            "/api/dreams/{id}",
            get(get_handler).put(update_handler).delete(delete_handler),
        )
        .route("/api/tags", get(tags_handler))
        .route("/api/stats", get(stats_handler))
}

/// GET /api/dreams
async fn list_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<DreamsResponse>> {
    let response = handle_list_dreams(&state.pool, auth.id(), query).await?;
    Ok(Json(response))
}

/// POST /api/dreams
async fn create_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<DreamEnvelope<DreamInput>>,
) -> Result<(StatusCode, Json<DreamEnvelope<Dream>>)> {
    let response = handle_create_dream(&state.pool, &auth.0, body.dream).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/dreams/{id}
async fn get_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DreamId>,
) -> Result<Json<DreamEnvelope<Dream>>> {
    let response = handle_get_dream(&state.pool, auth.id(), id).await?;
    Ok(Json(response))
}

/// PUT /api/dreams/{id}
async fn update_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DreamId>,
    Json(body): Json<DreamEnvelope<DreamPatch>>,
) -> Result<Json<DreamEnvelope<Dream>>> {
    let response = handle_update_dream(&state.pool, auth.id(), id, body.dream).await?;
    Ok(Json(response))
}

/// DELETE /api/dreams/{id}
async fn delete_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DreamId>,
) -> Result<Json<DeleteResponse>> {
    let response = handle_delete_dream(&state.pool, auth.id(), id).await?;
    Ok(Json(response))
}

/// GET /api/tags
async fn tags_handler(State(state): State<AppState>, auth: AuthUser) -> Result<Json<TagsResponse>> {
    let response = handle_list_tags(&state.pool, auth.id()).await?;
    Ok(Json(response))
}

/// GET /api/stats
async fn stats_handler(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsResponse>> {
    let response = handle_stats(&state.pool, auth.id(), query).await?;
    Ok(Json(response))
}
