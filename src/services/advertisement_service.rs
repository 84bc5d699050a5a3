use crate::{
    dto::advertisements::{AdvertisementList, CreateAdvertisementRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, Caller},
    models::Advertisement,
    policy::{ADVERTISEMENT_GATE, Action, Visibility},
    response::{ApiResponse, Meta},
    routes::params::AdvertisementQuery,
    state::AppState,
    store::{AdvertisementChanges, AdvertisementStore, NewAdvertisement, StoreError},
};

pub async fn list_advertisements(
    state: &AppState,
    caller: &Caller,
    query: AdvertisementQuery,
) -> AppResult<ApiResponse<AdvertisementList>> {
    let window = query.window();
    let page = state
        .store
        .list_advertisements(Visibility::for_caller(caller), &query.filter(), &window)
        .await?;

    let meta = Meta::for_window(&window, page.total);
    let data = AdvertisementList { items: page.items };
    Ok(ApiResponse::success("Advertisements", data, Some(meta)))
}

/// Looks up an advertisement the caller is allowed to read. Hidden ones are
/// reported as missing.
pub async fn find_visible(state: &AppState, caller: &Caller, id: i64) -> AppResult<Advertisement> {
    let advertisement = state
        .store
        .find_advertisement(id)
        .await?
        .ok_or(AppError::NotFound)?;

    if !Visibility::for_caller(caller).permits(advertisement.status, advertisement.creator.id) {
        return Err(AppError::NotFound);
    }
    Ok(advertisement)
}

pub async fn get_advertisement(
    state: &AppState,
    caller: &Caller,
    id: i64,
) -> AppResult<ApiResponse<Advertisement>> {
    let advertisement = find_visible(state, caller, id).await?;
    Ok(ApiResponse::success("Advertisement", advertisement, None))
}

pub async fn create_advertisement(
    state: &AppState,
    user: &AuthUser,
    payload: CreateAdvertisementRequest,
) -> AppResult<ApiResponse<Advertisement>> {
    let new = NewAdvertisement {
        title: validate_title(payload.title)?,
        description: payload.description,
        status: payload.status.unwrap_or_default(),
        creator_id: user.user_id,
    };

    let advertisement = state
        .store
        .insert_advertisement(new)
        .await
        .map_err(|err| write_failure(user, err))?;

    tracing::info!(
        advertisement_id = advertisement.id,
        user_id = %user.user_id,
        status = %advertisement.status,
        "advertisement created"
    );

    Ok(ApiResponse::success(
        "Advertisement created",
        advertisement,
        Some(Meta::empty()),
    ))
}

pub async fn update_advertisement(
    state: &AppState,
    user: &AuthUser,
    id: i64,
    mut changes: AdvertisementChanges,
) -> AppResult<ApiResponse<Advertisement>> {
    if let Some(title) = changes.title.take() {
        changes.title = Some(validate_title(title)?);
    }

    let caller = Caller::from(user.clone());
    let existing = find_visible(state, &caller, id).await?;
    ADVERTISEMENT_GATE.authorize(&caller, Action::Update, existing.creator.id)?;

    let advertisement = state
        .store
        .update_advertisement(id, user.user_id, changes)
        .await
        .map_err(|err| write_failure(user, err))?;

    tracing::info!(
        advertisement_id = advertisement.id,
        user_id = %user.user_id,
        status = %advertisement.status,
        "advertisement updated"
    );

    Ok(ApiResponse::success(
        "Updated",
        advertisement,
        Some(Meta::empty()),
    ))
}

pub async fn delete_advertisement(
    state: &AppState,
    user: &AuthUser,
    id: i64,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let caller = Caller::from(user.clone());
    let existing = find_visible(state, &caller, id).await?;
    ADVERTISEMENT_GATE.authorize(&caller, Action::Delete, existing.creator.id)?;

    state.store.delete_advertisement(id).await?;

    tracing::info!(advertisement_id = id, user_id = %user.user_id, "advertisement deleted");

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn validate_title(title: String) -> AppResult<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("title must not be empty".into()));
    }
    Ok(trimmed.to_string())
}

fn write_failure(user: &AuthUser, err: StoreError) -> AppError {
    if let StoreError::Quota(quota) = &err {
        tracing::info!(
            user_id = %user.user_id,
            limit = quota.limit,
            "open advertisement quota exceeded"
        );
    }
    err.into()
}
