use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::store::{AdvertisementFilter, DateRange, FavoriteFilter, PageWindow};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AdvertisementQuery {
    /// Page number, default 1.
    pub page: Option<u64>,
    /// Items per page, default 20, at most 100.
    pub per_page: Option<u64>,
    /// Creator username.
    pub creator: Option<String>,
    /// Created on or after this day.
    pub created_at_after: Option<NaiveDate>,
    /// Created on or before this day.
    pub created_at_before: Option<NaiveDate>,
}

impl AdvertisementQuery {
    pub fn window(&self) -> PageWindow {
        PageWindow::new(self.page, self.per_page)
    }

    pub fn filter(&self) -> AdvertisementFilter {
        AdvertisementFilter {
            creator: self.creator.clone(),
            created_at: DateRange {
                after: self.created_at_after,
                before: self.created_at_before,
            },
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FavoriteQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    pub favorite_id: Option<i64>,
    /// Advertisement id.
    pub id: Option<i64>,
    /// Username of the advertisement's creator.
    pub creator: Option<String>,
    /// Added on or after this day.
    pub added_at_after: Option<NaiveDate>,
    /// Added on or before this day.
    pub added_at_before: Option<NaiveDate>,
}

impl FavoriteQuery {
    pub fn window(&self) -> PageWindow {
        PageWindow::new(self.page, self.per_page)
    }

    pub fn filter(&self) -> FavoriteFilter {
        FavoriteFilter {
            favorite_id: self.favorite_id,
            advertisement_id: self.id,
            creator: self.creator.clone(),
            added_at: DateRange {
                after: self.added_at_after,
                before: self.added_at_before,
            },
        }
    }
}
