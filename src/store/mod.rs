//! Storage port for advertisements, favorites and identities.
//!
//! Services depend on the [`Store`] trait object held in
//! [`AppState`](crate::state::AppState). Two adapters exist:
//! [`PostgresStore`] backed by sea-orm, and [`MemoryStore`] for tests and
//! local experiments.
//!
//! Every adapter must uphold the same guarantees:
//!
//! - inserting a favorite that already exists for the same user fails with
//!   [`StoreError::UniqueViolation`], atomically with the insert;
//! - inserting or updating an advertisement into the open state runs the
//!   open-count check and the write inside one critical section per creator.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    models::{AdStatus, Advertisement, Favorite, UnknownStatus, User},
    policy::{QuotaExceeded, Visibility},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("identity {0} is not known to the store")]
    UnknownIdentity(Uuid),

    #[error("unique constraint violated")]
    UniqueViolation,

    #[error(transparent)]
    Quota(#[from] QuotaExceeded),

    #[error("database error: {0}")]
    Orm(#[from] sea_orm::DbErr),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

impl From<UnknownStatus> for StoreError {
    fn from(err: UnknownStatus) -> Self {
        StoreError::Corrupt(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A slice of a filtered collection plus the size of the whole collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

/// Resolved pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub limit: u64,
    pub offset: u64,
}

impl PageWindow {
    pub const DEFAULT_PER_PAGE: u64 = 20;
    pub const MAX_PER_PAGE: u64 = 100;

    pub fn new(page: Option<u64>, per_page: Option<u64>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let limit = per_page
            .unwrap_or(Self::DEFAULT_PER_PAGE)
            .clamp(1, Self::MAX_PER_PAGE);
        Self {
            page,
            limit,
            // Postgres takes OFFSET as a signed bigint.
            offset: (page - 1).saturating_mul(limit).min(i64::MAX as u64),
        }
    }
}

impl Default for PageWindow {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Inclusive calendar-day range, evaluated in UTC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub after: Option<NaiveDate>,
    pub before: Option<NaiveDate>,
}

impl DateRange {
    /// First instant inside the range.
    pub fn lower(&self) -> Option<DateTime<Utc>> {
        self.after.map(|day| day.and_time(NaiveTime::MIN).and_utc())
    }

    /// First instant past the range.
    pub fn upper(&self) -> Option<DateTime<Utc>> {
        self.before
            .and_then(|day| day.succ_opt())
            .map(|day| day.and_time(NaiveTime::MIN).and_utc())
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.lower().is_none_or(|lower| at >= lower) && self.upper().is_none_or(|upper| at < upper)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvertisementFilter {
    /// Creator username.
    pub creator: Option<String>,
    pub created_at: DateRange,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavoriteFilter {
    pub favorite_id: Option<i64>,
    pub advertisement_id: Option<i64>,
    /// Username of the favorited advertisement's creator.
    pub creator: Option<String>,
    pub added_at: DateRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAdvertisement {
    pub title: String,
    pub description: String,
    pub status: AdStatus,
    pub creator_id: Uuid,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvertisementChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<AdStatus>,
}

impl AdvertisementChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.status.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

#[async_trait]
pub trait AdvertisementStore: Send + Sync {
    /// Visible advertisements matching `filter`, ordered by id.
    async fn list_advertisements(
        &self,
        visibility: Visibility,
        filter: &AdvertisementFilter,
        window: &PageWindow,
    ) -> StoreResult<Page<Advertisement>>;

    /// Unscoped lookup; callers apply visibility themselves.
    async fn find_advertisement(&self, id: i64) -> StoreResult<Option<Advertisement>>;

    async fn count_open(&self, creator_id: Uuid) -> StoreResult<u64>;

    /// Inserts after checking the creator's open quota. On creation the
    /// creator is the acting user.
    ///
    /// Fails with [`StoreError::UnknownIdentity`] when the creator has no
    /// `users` row.
    async fn insert_advertisement(&self, new: NewAdvertisement) -> StoreResult<Advertisement>;

    /// Applies `changes` on behalf of `acting_id`.
    ///
    /// The write is validated against `changes.status`, defaulting to
    /// [`AdStatus::Open`], and an open target is checked against the acting
    /// user's own open count, whoever created the advertisement.
    async fn update_advertisement(
        &self,
        id: i64,
        acting_id: Uuid,
        changes: AdvertisementChanges,
    ) -> StoreResult<Advertisement>;

    /// Removes the advertisement and every favorite pointing at it.
    async fn delete_advertisement(&self, id: i64) -> StoreResult<()>;
}

#[async_trait]
pub trait FavoriteStore: Send + Sync {
    async fn insert_favorite(
        &self,
        user_id: Uuid,
        advertisement: &Advertisement,
    ) -> StoreResult<Favorite>;

    /// Favorites owned by `user_id`; `filter` narrows but never widens.
    async fn list_favorites(
        &self,
        user_id: Uuid,
        filter: &FavoriteFilter,
        window: &PageWindow,
    ) -> StoreResult<Page<Favorite>>;

    async fn find_favorite(&self, user_id: Uuid, favorite_id: i64)
    -> StoreResult<Option<Favorite>>;

    async fn delete_favorite(&self, user_id: Uuid, favorite_id: i64) -> StoreResult<()>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn upsert_user(&self, user: NewUser) -> StoreResult<User>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;
}

pub trait Store: AdvertisementStore + FavoriteStore + UserStore {}

impl<T> Store for T where T: AdvertisementStore + FavoriteStore + UserStore {}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn window_is_clamped() {
        assert_eq!(
            PageWindow::new(Some(0), Some(500)),
            PageWindow {
                page: 1,
                limit: 100,
                offset: 0
            }
        );
        assert_eq!(PageWindow::new(Some(3), Some(10)).offset, 20);
        assert_eq!(
            PageWindow::new(Some(u64::MAX), Some(50)).offset,
            i64::MAX as u64
        );
    }

    #[test]
    fn date_range_includes_whole_days() {
        let range = DateRange {
            after: NaiveDate::from_ymd_opt(2024, 3, 1),
            before: NaiveDate::from_ymd_opt(2024, 3, 2),
        };
        let at = |d, h| Utc.with_ymd_and_hms(2024, 3, d, h, 0, 0).unwrap();

        assert!(range.contains(at(1, 0)));
        assert!(range.contains(at(2, 23)));
        assert!(!range.contains(at(3, 0)));
        assert!(DateRange::default().contains(at(9, 12)));
    }
}
