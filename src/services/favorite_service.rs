use crate::{
    dto::favorites::FavoriteList,
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, Caller},
    models::Favorite,
    response::{ApiResponse, Meta},
    routes::params::FavoriteQuery,
    services::advertisement_service::find_visible,
    state::AppState,
    store::{FavoriteStore, StoreError},
};

pub const SELF_FAVORITE: &str = "Cannot favorite own advertisement";
pub const ALREADY_FAVORITED: &str = "Advertisement is already in favorites";

pub async fn add_favorite(
    state: &AppState,
    user: &AuthUser,
    advertisement_id: i64,
) -> AppResult<ApiResponse<Favorite>> {
    let advertisement = find_visible(state, &Caller::from(user.clone()), advertisement_id).await?;

    if advertisement.creator.id == user.user_id {
        tracing::debug!(advertisement_id, user_id = %user.user_id, "self favorite refused");
        return Err(AppError::Conflict(SELF_FAVORITE.into()));
    }

    // The unique (user, advertisement) constraint decides duplicates, so two
    // racing requests cannot both succeed.
    let favorite = state
        .store
        .insert_favorite(user.user_id, &advertisement)
        .await
        .map_err(|err| match err {
            StoreError::UniqueViolation => AppError::Conflict(ALREADY_FAVORITED.into()),
            other => other.into(),
        })?;

    tracing::info!(
        favorite_id = favorite.favorite_id,
        advertisement_id,
        user_id = %user.user_id,
        "favorite added"
    );

    Ok(ApiResponse::success(
        "Added to favorites",
        favorite,
        Some(Meta::empty()),
    ))
}

pub async fn list_favorites(
    state: &AppState,
    user: &AuthUser,
    query: FavoriteQuery,
) -> AppResult<ApiResponse<FavoriteList>> {
    let window = query.window();
    let page = state
        .store
        .list_favorites(user.user_id, &query.filter(), &window)
        .await?;

    let meta = Meta::for_window(&window, page.total);
    let data = FavoriteList { items: page.items };
    Ok(ApiResponse::success("OK", data, Some(meta)))
}

pub async fn get_favorite(
    state: &AppState,
    user: &AuthUser,
    favorite_id: i64,
) -> AppResult<ApiResponse<Favorite>> {
    let favorite = state
        .store
        .find_favorite(user.user_id, favorite_id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(ApiResponse::success("Favorite", favorite, None))
}

pub async fn remove_favorite(
    state: &AppState,
    user: &AuthUser,
    favorite_id: i64,
) -> AppResult<ApiResponse<serde_json::Value>> {
    state
        .store
        .delete_favorite(user.user_id, favorite_id)
        .await?;

    tracing::info!(favorite_id, user_id = %user.user_id, "favorite removed");

    Ok(ApiResponse::success(
        "Removed from favorites",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
