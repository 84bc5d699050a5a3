use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    models::{AdStatus, Advertisement},
    store::AdvertisementChanges,
};

/// Body for creating an advertisement. The creator always comes from the
/// bearer token; a `creator` field in the body is ignored.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAdvertisementRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Defaults to `OPEN`.
    pub status: Option<AdStatus>,
}

/// Full update (`PUT`). Omitted optional fields keep their stored values.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAdvertisementRequest {
    pub title: String,
    pub description: Option<String>,
    pub status: Option<AdStatus>,
}

/// Partial update (`PATCH`).
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PatchAdvertisementRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<AdStatus>,
}

impl From<UpdateAdvertisementRequest> for AdvertisementChanges {
    fn from(payload: UpdateAdvertisementRequest) -> Self {
        Self {
            title: Some(payload.title),
            description: payload.description,
            status: payload.status,
        }
    }
}

impl From<PatchAdvertisementRequest> for AdvertisementChanges {
    fn from(payload: PatchAdvertisementRequest) -> Self {
        Self {
            title: payload.title,
            description: payload.description,
            status: payload.status,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct AdvertisementList {
    #[schema(value_type = Vec<Advertisement>)]
    pub items: Vec<Advertisement>,
}
