use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
    SqlErr, TransactionTrait,
    ActiveValue::{NotSet, Set},
    sea_query::{LockType, OnConflict},
};
use uuid::Uuid;

use super::{
    AdvertisementChanges, AdvertisementFilter, AdvertisementStore, FavoriteFilter, FavoriteStore,
    NewAdvertisement, NewUser, Page, PageWindow, StoreError, StoreResult, UserStore,
};
use crate::{
    entity::{
        Advertisements, Favorites, Users, advertisements as ad, favorites as fav, users,
    },
    models::{AdStatus, Advertisement, Favorite, User},
    policy::{Visibility, quota},
};

/// sea-orm adapter over Postgres.
#[derive(Clone)]
pub struct PostgresStore {
    db: DatabaseConnection,
}

impl PostgresStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn advertisements_by_id(&self, ids: Vec<i64>) -> StoreResult<HashMap<i64, Advertisement>> {
        let rows = Advertisements::find()
            .find_also_related(Users)
            .filter(ad::Column::Id.is_in(ids))
            .all(&self.db)
            .await?;

        rows.into_iter()
            .map(|(model, creator)| -> StoreResult<(i64, Advertisement)> {
                let advertisement = joined_advertisement(model, creator)?;
                Ok((advertisement.id, advertisement))
            })
            .collect()
    }
}

pub(crate) fn visibility_condition(visibility: Visibility) -> Condition {
    let draft = AdStatus::Draft.as_str();
    match visibility {
        Visibility::Everything => Condition::all(),
        Visibility::Public => Condition::all().add(ad::Column::Status.ne(draft)),
        Visibility::Member(user_id) => Condition::any()
            .add(ad::Column::Status.ne(draft))
            .add(ad::Column::CreatorId.eq(user_id)),
    }
}

fn advertisement_condition(visibility: Visibility, filter: &AdvertisementFilter) -> Condition {
    let mut condition = Condition::all().add(visibility_condition(visibility));

    if let Some(username) = filter.creator.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(users::Column::Username.eq(username.clone()));
    }
    if let Some(lower) = filter.created_at.lower() {
        condition = condition.add(ad::Column::CreatedAt.gte(lower));
    }
    if let Some(upper) = filter.created_at.upper() {
        condition = condition.add(ad::Column::CreatedAt.lt(upper));
    }

    condition
}

fn favorite_condition(user_id: Uuid, filter: &FavoriteFilter) -> Condition {
    // Ownership first; the rest can only narrow it.
    let mut condition = Condition::all().add(fav::Column::UserId.eq(user_id));

    if let Some(favorite_id) = filter.favorite_id {
        condition = condition.add(fav::Column::Id.eq(favorite_id));
    }
    if let Some(advertisement_id) = filter.advertisement_id {
        condition = condition.add(fav::Column::AdvertisementId.eq(advertisement_id));
    }
    if let Some(username) = filter.creator.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(users::Column::Username.eq(username.clone()));
    }
    if let Some(lower) = filter.added_at.lower() {
        condition = condition.add(fav::Column::AddedAt.gte(lower));
    }
    if let Some(upper) = filter.added_at.upper() {
        condition = condition.add(fav::Column::AddedAt.lt(upper));
    }

    condition
}

async fn count_open_in<C: ConnectionTrait>(conn: &C, creator_id: Uuid) -> Result<u64, DbErr> {
    Advertisements::find()
        .filter(ad::Column::CreatorId.eq(creator_id))
        .filter(ad::Column::Status.eq(AdStatus::Open.as_str()))
        .count(conn)
        .await
}

/// Locks the acting user's row so open-count checks for the same user run
/// one at a time.
async fn lock_user<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> StoreResult<users::Model> {
    Users::find_by_id(user_id)
        .lock(LockType::Update)
        .one(conn)
        .await?
        .ok_or(StoreError::UnknownIdentity(user_id))
}

fn map_insert_error(err: DbErr) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => StoreError::UniqueViolation,
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => StoreError::NotFound,
        _ => StoreError::Orm(err),
    }
}

#[async_trait]
impl AdvertisementStore for PostgresStore {
    async fn list_advertisements(
        &self,
        visibility: Visibility,
        filter: &AdvertisementFilter,
        window: &PageWindow,
    ) -> StoreResult<Page<Advertisement>> {
        let condition = advertisement_condition(visibility, filter);

        let total = Advertisements::find()
            .inner_join(Users)
            .filter(condition.clone())
            .count(&self.db)
            .await?;

        let items = Advertisements::find()
            .find_also_related(Users)
            .filter(condition)
            .order_by_asc(ad::Column::Id)
            .limit(window.limit)
            .offset(window.offset)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|(model, creator)| joined_advertisement(model, creator))
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(Page { items, total })
    }

    async fn find_advertisement(&self, id: i64) -> StoreResult<Option<Advertisement>> {
        Advertisements::find_by_id(id)
            .find_also_related(Users)
            .one(&self.db)
            .await?
            .map(|(model, creator)| joined_advertisement(model, creator))
            .transpose()
    }

    async fn count_open(&self, creator_id: Uuid) -> StoreResult<u64> {
        Ok(count_open_in(&self.db, creator_id).await?)
    }

    async fn insert_advertisement(&self, new: NewAdvertisement) -> StoreResult<Advertisement> {
        let txn = self.db.begin().await?;
        let creator = lock_user(&txn, new.creator_id).await?;

        if quota::applies(new.status) {
            quota::check(count_open_in(&txn, creator.id).await?)?;
        }

        let active = ad::ActiveModel {
            id: NotSet,
            title: Set(new.title),
            description: Set(new.description),
            status: Set(new.status.as_str().to_string()),
            creator_id: Set(creator.id),
            created_at: NotSet,
        };
        let model = active.insert(&txn).await?;

        txn.commit().await?;

        advertisement_from_entity(model, creator)
    }

    async fn update_advertisement(
        &self,
        id: i64,
        acting_id: Uuid,
        changes: AdvertisementChanges,
    ) -> StoreResult<Advertisement> {
        let txn = self.db.begin().await?;
        let acting = lock_user(&txn, acting_id).await?;
        let existing = Advertisements::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(StoreError::NotFound)?;

        if quota::applies(quota::target(changes.status)) {
            quota::check(count_open_in(&txn, acting.id).await?)?;
        }

        let creator = if existing.creator_id == acting.id {
            acting
        } else {
            Users::find_by_id(existing.creator_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    StoreError::Corrupt(format!("advertisement {id} lost its creator"))
                })?
        };

        if changes.is_empty() {
            return advertisement_from_entity(existing, creator);
        }

        let mut active: ad::ActiveModel = existing.into();
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(description) = changes.description {
            active.description = Set(description);
        }
        if let Some(status) = changes.status {
            active.status = Set(status.as_str().to_string());
        }
        let model = active.update(&txn).await?;

        txn.commit().await?;

        advertisement_from_entity(model, creator)
    }

    async fn delete_advertisement(&self, id: i64) -> StoreResult<()> {
        let result = Advertisements::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl FavoriteStore for PostgresStore {
    async fn insert_favorite(
        &self,
        user_id: Uuid,
        advertisement: &Advertisement,
    ) -> StoreResult<Favorite> {
        Users::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or(StoreError::UnknownIdentity(user_id))?;

        let active = fav::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            advertisement_id: Set(advertisement.id),
            added_at: NotSet,
        };
        let model = active.insert(&self.db).await.map_err(map_insert_error)?;

        Ok(favorite_from_entity(model, advertisement.clone()))
    }

    async fn list_favorites(
        &self,
        user_id: Uuid,
        filter: &FavoriteFilter,
        window: &PageWindow,
    ) -> StoreResult<Page<Favorite>> {
        let finder = Favorites::find()
            .join(JoinType::InnerJoin, fav::Relation::Advertisements.def())
            .join(JoinType::InnerJoin, ad::Relation::Users.def())
            .filter(favorite_condition(user_id, filter));

        let total = finder.clone().count(&self.db).await?;

        let rows = finder
            .order_by_asc(fav::Column::Id)
            .limit(window.limit)
            .offset(window.offset)
            .all(&self.db)
            .await?;

        let mut advertisements = self
            .advertisements_by_id(rows.iter().map(|row| row.advertisement_id).collect())
            .await?;

        let items = rows
            .into_iter()
            .map(|row| -> StoreResult<Favorite> {
                let advertisement = advertisements
                    .remove(&row.advertisement_id)
                    .ok_or_else(|| {
                        StoreError::Corrupt(format!("favorite {} lost its advertisement", row.id))
                    })?;
                Ok(favorite_from_entity(row, advertisement))
            })
            .collect::<StoreResult<Vec<_>>>()?;

        Ok(Page { items, total })
    }

    async fn find_favorite(
        &self,
        user_id: Uuid,
        favorite_id: i64,
    ) -> StoreResult<Option<Favorite>> {
        let row = Favorites::find()
            .filter(fav::Column::Id.eq(favorite_id))
            .filter(fav::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let advertisement = self
            .find_advertisement(row.advertisement_id)
            .await?
            .ok_or(StoreError::NotFound)?;

        Ok(Some(favorite_from_entity(row, advertisement)))
    }

    async fn delete_favorite(&self, user_id: Uuid, favorite_id: i64) -> StoreResult<()> {
        let result = Favorites::delete_many()
            .filter(fav::Column::Id.eq(favorite_id))
            .filter(fav::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    async fn upsert_user(&self, user: NewUser) -> StoreResult<User> {
        let id = user.id;
        let active = users::ActiveModel {
            id: Set(user.id),
            username: Set(user.username),
            first_name: Set(user.first_name),
            last_name: Set(user.last_name),
            role: Set(user.role),
            created_at: NotSet,
        };

        Users::insert(active)
            .on_conflict(
                OnConflict::column(users::Column::Id)
                    .update_columns([
                        users::Column::Username,
                        users::Column::FirstName,
                        users::Column::LastName,
                        users::Column::Role,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(map_insert_error)?;

        self.find_user(id).await?.ok_or(StoreError::NotFound)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(Users::find_by_id(id)
            .one(&self.db)
            .await?
            .map(user_from_entity))
    }
}

fn user_from_entity(model: users::Model) -> User {
    User {
        id: model.id,
        username: model.username,
        first_name: model.first_name,
        last_name: model.last_name,
    }
}

fn joined_advertisement(
    model: ad::Model,
    creator: Option<users::Model>,
) -> StoreResult<Advertisement> {
    let creator = creator.ok_or_else(|| {
        StoreError::Corrupt(format!("advertisement {} has no creator", model.id))
    })?;
    advertisement_from_entity(model, creator)
}

fn advertisement_from_entity(model: ad::Model, creator: users::Model) -> StoreResult<Advertisement> {
    Ok(Advertisement {
        id: model.id,
        title: model.title,
        description: model.description,
        creator: user_from_entity(creator),
        status: model.status.parse()?,
        created_at: model.created_at.with_timezone(&Utc),
    })
}

fn favorite_from_entity(model: fav::Model, advertisement: Advertisement) -> Favorite {
    Favorite {
        favorite_id: model.id,
        advertisement,
        added_at: model.added_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DbBackend, QueryTrait};

    use super::*;

    fn sql(condition: Condition) -> String {
        Advertisements::find()
            .filter(condition)
            .build(DbBackend::Postgres)
            .to_string()
    }

    #[test]
    fn public_condition_hides_drafts() {
        let sql = sql(visibility_condition(Visibility::Public));
        assert!(sql.contains(r#""advertisements"."status" <> 'DRAFT'"#), "{sql}");
    }

    #[test]
    fn member_condition_keeps_own_drafts() {
        let user_id = Uuid::nil();
        let sql = sql(visibility_condition(Visibility::Member(user_id)));
        assert!(sql.contains(" OR "), "{sql}");
        assert!(sql.contains(r#""advertisements"."creator_id" ="#), "{sql}");
    }

    #[test]
    fn everything_condition_adds_no_predicate() {
        let sql = sql(visibility_condition(Visibility::Everything));
        assert!(!sql.contains("WHERE"), "{sql}");
    }

    #[test]
    fn favorite_filters_cannot_drop_ownership() {
        let owner = Uuid::new_v4();
        let filter = FavoriteFilter {
            creator: Some("bob".into()),
            ..Default::default()
        };
        let sql = Favorites::find()
            .filter(favorite_condition(owner, &filter))
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.contains(&owner.to_string()), "{sql}");
        assert!(sql.contains(" AND "), "{sql}");
    }
}
