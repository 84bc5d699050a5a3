mod common;

use chrono::Utc;
use classifieds_api::{
    dto::advertisements::CreateAdvertisementRequest,
    error::AppError,
    middleware::auth::AuthUser,
    models::{AdStatus, Advertisement},
    routes::params::FavoriteQuery,
    services::{
        advertisement_service,
        favorite_service::{self, ALREADY_FAVORITED, SELF_FAVORITE},
    },
    state::AppState,
    store::AdvertisementStore,
};

async fn advertise(
    state: &AppState,
    user: &AuthUser,
    title: &str,
    status: AdStatus,
) -> Advertisement {
    advertisement_service::create_advertisement(
        state,
        user,
        CreateAdvertisementRequest {
            title: title.to_string(),
            description: String::new(),
            status: Some(status),
        },
    )
    .await
    .expect("create advertisement")
    .data
    .expect("advertisement")
}

async fn favorite_ids(state: &AppState, user: &AuthUser, query: FavoriteQuery) -> Vec<i64> {
    favorite_service::list_favorites(state, user, query)
        .await
        .expect("list favorites")
        .data
        .expect("favorites")
        .items
        .into_iter()
        .map(|favorite| favorite.favorite_id)
        .collect()
}

#[tokio::test]
async fn bob_favorites_alice_once() {
    let state = common::memory_state();
    let alice = common::member(&state, "alice").await;
    let bob = common::member(&state, "bob").await;
    let ad = advertise(&state, &alice, "Bike", AdStatus::Open).await;

    let before = Utc::now();
    let resp = favorite_service::add_favorite(&state, &bob, ad.id)
        .await
        .unwrap();
    assert_eq!(resp.message, "Added to favorites");
    let favorite = resp.data.unwrap();
    assert_eq!(favorite.advertisement.id, ad.id);
    assert!(favorite.added_at >= before);

    let err = favorite_service::add_favorite(&state, &bob, ad.id)
        .await
        .unwrap_err();
    assert!(matches!(&err, AppError::Conflict(msg) if msg == ALREADY_FAVORITED));

    assert_eq!(
        favorite_ids(&state, &bob, Default::default()).await,
        vec![favorite.favorite_id]
    );
}

#[tokio::test]
async fn own_advertisement_cannot_be_favorited() {
    let state = common::memory_state();
    let alice = common::member(&state, "alice").await;
    let ad = advertise(&state, &alice, "Bike", AdStatus::Open).await;

    let err = favorite_service::add_favorite(&state, &alice, ad.id)
        .await
        .unwrap_err();
    assert!(matches!(&err, AppError::Conflict(msg) if msg == SELF_FAVORITE));
    assert!(favorite_ids(&state, &alice, Default::default()).await.is_empty());
}

#[tokio::test]
async fn superuser_cannot_favorite_own_advertisement_either() {
    let state = common::memory_state();
    let admin = common::superuser(&state, "admin").await;
    let ad = advertise(&state, &admin, "Notice", AdStatus::Open).await;

    let err = favorite_service::add_favorite(&state, &admin, ad.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn missing_or_hidden_advertisements_are_not_found() {
    let state = common::memory_state();
    let alice = common::member(&state, "alice").await;
    let bob = common::member(&state, "bob").await;
    let draft = advertise(&state, &alice, "Draft", AdStatus::Draft).await;

    let err = favorite_service::add_favorite(&state, &bob, 9_999)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let err = favorite_service::add_favorite(&state, &bob, draft.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_duplicates_yield_exactly_one_favorite() {
    let state = common::memory_state();
    let alice = common::member(&state, "alice").await;
    let bob = common::member(&state, "bob").await;
    let ad = advertise(&state, &alice, "Bike", AdStatus::Open).await;

    let ad_id = ad.id;
    let attempts: Vec<_> = (0..8)
        .map(|_| {
            let state = state.clone();
            let bob = bob.clone();
            tokio::spawn(async move { favorite_service::add_favorite(&state, &bob, ad_id).await })
        })
        .collect();

    let mut successes = 0;
    let mut conflicts = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(_) => successes += 1,
            Err(AppError::Conflict(_)) => conflicts += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(successes, 1);
    assert_eq!(conflicts, 7);
    assert_eq!(favorite_ids(&state, &bob, Default::default()).await.len(), 1);
}

#[tokio::test]
async fn listing_is_scoped_to_the_caller_whatever_the_filters() {
    let state = common::memory_state();
    let alice = common::member(&state, "alice").await;
    let bob = common::member(&state, "bob").await;
    let carol = common::member(&state, "carol").await;

    let alice_ad = advertise(&state, &alice, "Bike", AdStatus::Open).await;
    let carol_ad = advertise(&state, &carol, "Lamp", AdStatus::Open).await;

    let bob_on_alice = favorite_service::add_favorite(&state, &bob, alice_ad.id)
        .await
        .unwrap()
        .data
        .unwrap();
    let bob_on_carol = favorite_service::add_favorite(&state, &bob, carol_ad.id)
        .await
        .unwrap()
        .data
        .unwrap();
    favorite_service::add_favorite(&state, &alice, carol_ad.id)
        .await
        .unwrap();

    assert_eq!(
        favorite_ids(&state, &bob, Default::default()).await,
        vec![bob_on_alice.favorite_id, bob_on_carol.favorite_id]
    );

    let by_creator = FavoriteQuery {
        creator: Some("carol".into()),
        ..Default::default()
    };
    assert_eq!(
        favorite_ids(&state, &bob, by_creator).await,
        vec![bob_on_carol.favorite_id]
    );

    let by_advertisement = FavoriteQuery {
        id: Some(alice_ad.id),
        ..Default::default()
    };
    assert_eq!(
        favorite_ids(&state, &bob, by_advertisement).await,
        vec![bob_on_alice.favorite_id]
    );

    // Naming someone else's favorite id narrows alice's list to nothing.
    let foreign_id = FavoriteQuery {
        favorite_id: Some(bob_on_alice.favorite_id),
        ..Default::default()
    };
    assert!(favorite_ids(&state, &alice, foreign_id).await.is_empty());

    let today = Utc::now().date_naive();
    let added_today = FavoriteQuery {
        added_at_after: Some(today),
        added_at_before: Some(today),
        ..Default::default()
    };
    assert_eq!(favorite_ids(&state, &bob, added_today).await.len(), 2);
}

#[tokio::test]
async fn other_users_favorites_look_missing() {
    let state = common::memory_state();
    let alice = common::member(&state, "alice").await;
    let bob = common::member(&state, "bob").await;
    let ad = advertise(&state, &alice, "Bike", AdStatus::Open).await;
    let favorite = favorite_service::add_favorite(&state, &bob, ad.id)
        .await
        .unwrap()
        .data
        .unwrap();

    let err = favorite_service::get_favorite(&state, &alice, favorite.favorite_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let err = favorite_service::remove_favorite(&state, &alice, favorite.favorite_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let own = favorite_service::get_favorite(&state, &bob, favorite.favorite_id)
        .await
        .unwrap();
    assert_eq!(own.data.unwrap().advertisement.id, ad.id);

    favorite_service::remove_favorite(&state, &bob, favorite.favorite_id)
        .await
        .unwrap();
    let err = favorite_service::get_favorite(&state, &bob, favorite.favorite_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    // Removing the favorite leaves the advertisement in place.
    assert!(state.store.find_advertisement(ad.id).await.unwrap().is_some());
}
