use sea_orm::entity::prelude::*;

/// One row per (user, advertisement) pair; the pair carries a unique
/// constraint in the schema.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "favorites")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: Uuid,
    pub advertisement_id: i64,
    pub added_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::advertisements::Entity",
        from = "Column::AdvertisementId",
        to = "super::advertisements::Column::Id"
    )]
    Advertisements,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::advertisements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Advertisements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
