use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        advertisements::{
            AdvertisementList, CreateAdvertisementRequest, PatchAdvertisementRequest,
            UpdateAdvertisementRequest,
        },
        favorites::FavoriteList,
    },
    models::{AdStatus, Advertisement, Favorite, User},
    response::{ApiResponse, Meta},
    routes::{advertisements, favorites, health},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        advertisements::list_advertisements,
        advertisements::get_advertisement,
        advertisements::create_advertisement,
        advertisements::update_advertisement,
        advertisements::patch_advertisement,
        advertisements::delete_advertisement,
        advertisements::add_to_favorite,
        favorites::list_favorites,
        favorites::get_favorite,
        favorites::remove_favorite
    ),
    components(
        schemas(
            User,
            AdStatus,
            Advertisement,
            Favorite,
            AdvertisementList,
            FavoriteList,
            CreateAdvertisementRequest,
            UpdateAdvertisementRequest,
            PatchAdvertisementRequest,
            Meta,
            ApiResponse<Advertisement>,
            ApiResponse<AdvertisementList>,
            ApiResponse<Favorite>,
            ApiResponse<FavoriteList>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Advertisements", description = "Advertisement endpoints"),
        (name = "Favorites", description = "Favorite endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
