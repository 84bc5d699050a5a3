use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};

use crate::{
    dto::favorites::FavoriteList,
    error::AppResult,
    middleware::auth::AuthUser,
    models::Favorite,
    response::ApiResponse,
    routes::params::FavoriteQuery,
    services::favorite_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_favorites))
        .route("/{favorite_id}", get(get_favorite).delete(remove_favorite))
}

#[utoipa::path(
    get,
    path = "/api/favorites",
    params(FavoriteQuery),
    responses(
        (status = 200, description = "Caller's favorites", body = ApiResponse<FavoriteList>),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn list_favorites(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<FavoriteQuery>,
) -> AppResult<Json<ApiResponse<FavoriteList>>> {
    let resp = favorite_service::list_favorites(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/favorites/{favorite_id}",
    params(
        ("favorite_id" = i64, Path, description = "Favorite ID")
    ),
    responses(
        (status = 200, description = "Get favorite", body = ApiResponse<Favorite>),
        (status = 404, description = "Favorite not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn get_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(favorite_id): Path<i64>,
) -> AppResult<Json<ApiResponse<Favorite>>> {
    let resp = favorite_service::get_favorite(&state, &user, favorite_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/favorites/{favorite_id}",
    params(
        ("favorite_id" = i64, Path, description = "Favorite ID")
    ),
    responses(
        (status = 200, description = "Removed from favorites", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Favorite not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn remove_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(favorite_id): Path<i64>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = favorite_service::remove_favorite(&state, &user, favorite_id).await?;
    Ok(Json(resp))
}
