use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    AdvertisementChanges, AdvertisementFilter, AdvertisementStore, FavoriteFilter, FavoriteStore,
    NewAdvertisement, NewUser, Page, PageWindow, StoreError, StoreResult, UserStore,
};
use crate::{
    models::{AdStatus, Advertisement, Favorite, User},
    policy::{Visibility, quota},
};

#[derive(Debug, Clone)]
struct UserRow {
    user: User,
}

#[derive(Debug, Clone)]
struct AdvertisementRow {
    id: i64,
    title: String,
    description: String,
    status: AdStatus,
    creator_id: Uuid,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct FavoriteRow {
    id: i64,
    user_id: Uuid,
    advertisement_id: i64,
    added_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, UserRow>,
    advertisements: BTreeMap<i64, AdvertisementRow>,
    favorites: BTreeMap<i64, FavoriteRow>,
    next_advertisement_id: i64,
    next_favorite_id: i64,
}

impl Tables {
    fn creator(&self, id: Uuid) -> StoreResult<&User> {
        self.users
            .get(&id)
            .map(|row| &row.user)
            .ok_or(StoreError::UnknownIdentity(id))
    }

    fn advertisement(&self, row: &AdvertisementRow) -> StoreResult<Advertisement> {
        let creator = self.creator(row.creator_id)?.clone();
        Ok(Advertisement {
            id: row.id,
            title: row.title.clone(),
            description: row.description.clone(),
            creator,
            status: row.status,
            created_at: row.created_at,
        })
    }

    fn favorite(&self, row: &FavoriteRow) -> StoreResult<Favorite> {
        let advertisement = self
            .advertisements
            .get(&row.advertisement_id)
            .ok_or(StoreError::NotFound)
            .and_then(|ad| self.advertisement(ad))?;
        Ok(Favorite {
            favorite_id: row.id,
            advertisement,
            added_at: row.added_at,
        })
    }

    fn count_open(&self, creator_id: Uuid) -> u64 {
        self.advertisements
            .values()
            .filter(|row| row.creator_id == creator_id && row.status == AdStatus::Open)
            .count() as u64
    }

    fn creator_matches(&self, creator_id: Uuid, username: Option<&str>) -> bool {
        match username.filter(|s| !s.is_empty()) {
            None => true,
            Some(username) => self
                .users
                .get(&creator_id)
                .is_some_and(|row| row.user.username == username),
        }
    }
}

fn window_of<T>(items: Vec<T>, window: &PageWindow) -> Page<T> {
    let total = items.len() as u64;
    let items = items
        .into_iter()
        .skip(window.offset as usize)
        .take(window.limit as usize)
        .collect();
    Page { items, total }
}

/// Store kept entirely in process memory.
///
/// A single mutex guards all tables, so quota checks and unique inserts are
/// serialized the same way the Postgres store serializes them.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AdvertisementStore for MemoryStore {
    async fn list_advertisements(
        &self,
        visibility: Visibility,
        filter: &AdvertisementFilter,
        window: &PageWindow,
    ) -> StoreResult<Page<Advertisement>> {
        let tables = self.tables.lock().await;
        let items = tables
            .advertisements
            .values()
            .filter(|row| visibility.permits(row.status, row.creator_id))
            .filter(|row| tables.creator_matches(row.creator_id, filter.creator.as_deref()))
            .filter(|row| filter.created_at.contains(row.created_at))
            .map(|row| tables.advertisement(row))
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(window_of(items, window))
    }

    async fn find_advertisement(&self, id: i64) -> StoreResult<Option<Advertisement>> {
        let tables = self.tables.lock().await;
        tables
            .advertisements
            .get(&id)
            .map(|row| tables.advertisement(row))
            .transpose()
    }

    async fn count_open(&self, creator_id: Uuid) -> StoreResult<u64> {
        Ok(self.tables.lock().await.count_open(creator_id))
    }

    async fn insert_advertisement(&self, new: NewAdvertisement) -> StoreResult<Advertisement> {
        let mut tables = self.tables.lock().await;
        tables.creator(new.creator_id)?;

        if quota::applies(new.status) {
            quota::check(tables.count_open(new.creator_id))?;
        }

        tables.next_advertisement_id += 1;
        let row = AdvertisementRow {
            id: tables.next_advertisement_id,
            title: new.title,
            description: new.description,
            status: new.status,
            creator_id: new.creator_id,
            created_at: Utc::now(),
        };
        let advertisement = tables.advertisement(&row)?;
        tables.advertisements.insert(row.id, row);
        Ok(advertisement)
    }

    async fn update_advertisement(
        &self,
        id: i64,
        acting_id: Uuid,
        changes: AdvertisementChanges,
    ) -> StoreResult<Advertisement> {
        let mut tables = self.tables.lock().await;
        tables.creator(acting_id)?;
        let mut row = tables
            .advertisements
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)?;

        if quota::applies(quota::target(changes.status)) {
            quota::check(tables.count_open(acting_id))?;
        }
        if let Some(status) = changes.status {
            row.status = status;
        }
        if let Some(title) = changes.title {
            row.title = title;
        }
        if let Some(description) = changes.description {
            row.description = description;
        }

        let advertisement = tables.advertisement(&row)?;
        tables.advertisements.insert(id, row);
        Ok(advertisement)
    }

    async fn delete_advertisement(&self, id: i64) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        tables
            .advertisements
            .remove(&id)
            .ok_or(StoreError::NotFound)?;
        tables
            .favorites
            .retain(|_, favorite| favorite.advertisement_id != id);
        Ok(())
    }
}

#[async_trait]
impl FavoriteStore for MemoryStore {
    async fn insert_favorite(
        &self,
        user_id: Uuid,
        advertisement: &Advertisement,
    ) -> StoreResult<Favorite> {
        let mut tables = self.tables.lock().await;
        tables.creator(user_id)?;
        if !tables.advertisements.contains_key(&advertisement.id) {
            return Err(StoreError::NotFound);
        }
        let duplicate = tables
            .favorites
            .values()
            .any(|row| row.user_id == user_id && row.advertisement_id == advertisement.id);
        if duplicate {
            return Err(StoreError::UniqueViolation);
        }

        tables.next_favorite_id += 1;
        let row = FavoriteRow {
            id: tables.next_favorite_id,
            user_id,
            advertisement_id: advertisement.id,
            added_at: Utc::now(),
        };
        let favorite = tables.favorite(&row)?;
        tables.favorites.insert(row.id, row);
        Ok(favorite)
    }

    async fn list_favorites(
        &self,
        user_id: Uuid,
        filter: &FavoriteFilter,
        window: &PageWindow,
    ) -> StoreResult<Page<Favorite>> {
        let tables = self.tables.lock().await;
        let items = tables
            .favorites
            .values()
            .filter(|row| row.user_id == user_id)
            .filter(|row| filter.favorite_id.is_none_or(|id| row.id == id))
            .filter(|row| {
                filter
                    .advertisement_id
                    .is_none_or(|id| row.advertisement_id == id)
            })
            .filter(|row| filter.added_at.contains(row.added_at))
            .filter(|row| {
                tables
                    .advertisements
                    .get(&row.advertisement_id)
                    .is_some_and(|ad| {
                        tables.creator_matches(ad.creator_id, filter.creator.as_deref())
                    })
            })
            .map(|row| tables.favorite(row))
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(window_of(items, window))
    }

    async fn find_favorite(
        &self,
        user_id: Uuid,
        favorite_id: i64,
    ) -> StoreResult<Option<Favorite>> {
        let tables = self.tables.lock().await;
        tables
            .favorites
            .get(&favorite_id)
            .filter(|row| row.user_id == user_id)
            .map(|row| tables.favorite(row))
            .transpose()
    }

    async fn delete_favorite(&self, user_id: Uuid, favorite_id: i64) -> StoreResult<()> {
        let mut tables = self.tables.lock().await;
        let owned = tables
            .favorites
            .get(&favorite_id)
            .is_some_and(|row| row.user_id == user_id);
        if !owned {
            return Err(StoreError::NotFound);
        }
        tables.favorites.remove(&favorite_id);
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn upsert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.lock().await;
        let taken = tables
            .users
            .values()
            .any(|row| row.user.username == user.username && row.user.id != user.id);
        if taken {
            return Err(StoreError::UniqueViolation);
        }

        let projection = User {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
        };
        tables.users.insert(
            user.id,
            UserRow {
                user: projection.clone(),
            },
        );
        Ok(projection)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.get(&id).map(|row| row.user.clone()))
    }
}
