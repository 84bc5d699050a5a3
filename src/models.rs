use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Public projection of an identity owned by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

/// Lifecycle state of an advertisement.
///
/// `Open` is the default for writes that do not name a status. Only `Draft`
/// affects visibility; every other state is visible like `Open`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum AdStatus {
    Draft,
    #[default]
    Open,
    Closed,
}

impl AdStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdStatus::Draft => "DRAFT",
            AdStatus::Open => "OPEN",
            AdStatus::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for AdStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown advertisement status `{0}`")]
pub struct UnknownStatus(pub String);

impl FromStr for AdStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DRAFT" => Ok(AdStatus::Draft),
            "OPEN" => Ok(AdStatus::Open),
            "CLOSED" => Ok(AdStatus::Closed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Advertisement {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub creator: User,
    pub status: AdStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Favorite {
    pub favorite_id: i64,
    pub advertisement: Advertisement,
    pub added_at: DateTime<Utc>,
}
