use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};

use crate::{
    dto::advertisements::{
        AdvertisementList, CreateAdvertisementRequest, PatchAdvertisementRequest,
        UpdateAdvertisementRequest,
    },
    error::AppResult,
    middleware::auth::{AuthUser, Caller},
    models::{Advertisement, Favorite},
    response::ApiResponse,
    routes::params::AdvertisementQuery,
    services::{advertisement_service, favorite_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_advertisements).post(create_advertisement))
        .route(
            "/{id}",
            get(get_advertisement)
                .put(update_advertisement)
                .patch(patch_advertisement)
                .delete(delete_advertisement),
        )
        .route("/{id}/add_to_favorite", post(add_to_favorite))
}

#[utoipa::path(
    get,
    path = "/api/advertisements",
    params(AdvertisementQuery),
    responses(
        (status = 200, description = "Advertisements visible to the caller", body = ApiResponse<AdvertisementList>)
    ),
    tag = "Advertisements"
)]
pub async fn list_advertisements(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<AdvertisementQuery>,
) -> AppResult<Json<ApiResponse<AdvertisementList>>> {
    let resp = advertisement_service::list_advertisements(&state, &caller, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/advertisements/{id}",
    params(
        ("id" = i64, Path, description = "Advertisement ID")
    ),
    responses(
        (status = 200, description = "Get advertisement", body = ApiResponse<Advertisement>),
        (status = 404, description = "Advertisement not found or not visible")
    ),
    tag = "Advertisements"
)]
pub async fn get_advertisement(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Advertisement>>> {
    let resp = advertisement_service::get_advertisement(&state, &caller, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/advertisements",
    request_body = CreateAdvertisementRequest,
    responses(
        (status = 200, description = "Advertisement created", body = ApiResponse<Advertisement>),
        (status = 400, description = "Invalid input or open advertisements limit exceeded"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = [])),
    tag = "Advertisements"
)]
pub async fn create_advertisement(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateAdvertisementRequest>,
) -> AppResult<Json<ApiResponse<Advertisement>>> {
    let resp = advertisement_service::create_advertisement(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/advertisements/{id}",
    params(
        ("id" = i64, Path, description = "Advertisement ID")
    ),
    request_body = UpdateAdvertisementRequest,
    responses(
        (status = 200, description = "Updated advertisement", body = ApiResponse<Advertisement>),
        (status = 400, description = "Invalid input or open advertisements limit exceeded"),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Advertisement not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Advertisements"
)]
pub async fn update_advertisement(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateAdvertisementRequest>,
) -> AppResult<Json<ApiResponse<Advertisement>>> {
    let resp =
        advertisement_service::update_advertisement(&state, &user, id, payload.into()).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/advertisements/{id}",
    params(
        ("id" = i64, Path, description = "Advertisement ID")
    ),
    request_body = PatchAdvertisementRequest,
    responses(
        (status = 200, description = "Updated advertisement", body = ApiResponse<Advertisement>),
        (status = 400, description = "Invalid input or open advertisements limit exceeded"),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Advertisement not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Advertisements"
)]
pub async fn patch_advertisement(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<PatchAdvertisementRequest>,
) -> AppResult<Json<ApiResponse<Advertisement>>> {
    let resp =
        advertisement_service::update_advertisement(&state, &user, id, payload.into()).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/advertisements/{id}",
    params(
        ("id" = i64, Path, description = "Advertisement ID")
    ),
    responses(
        (status = 200, description = "Deleted advertisement", body = ApiResponse<serde_json::Value>),
        (status = 403, description = "Not the creator"),
        (status = 404, description = "Advertisement not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Advertisements"
)]
pub async fn delete_advertisement(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = advertisement_service::delete_advertisement(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/advertisements/{id}/add_to_favorite",
    params(
        ("id" = i64, Path, description = "Advertisement ID")
    ),
    responses(
        (status = 200, description = "Added to favorites", body = ApiResponse<Favorite>),
        (status = 404, description = "Advertisement not found"),
        (status = 409, description = "Own advertisement or already in favorites")
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn add_to_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<ApiResponse<Favorite>>> {
    let resp = favorite_service::add_favorite(&state, &user, id).await?;
    Ok(Json(resp))
}
