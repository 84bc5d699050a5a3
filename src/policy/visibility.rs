use uuid::Uuid;

use crate::{middleware::auth::Caller, models::AdStatus};

/// Which advertisements a caller may read.
///
/// Stores render this into their own filter form; the in-process form is
/// [`Visibility::permits`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Anonymous callers: everything except drafts.
    Public,
    /// Authenticated callers: everything except other people's drafts.
    Member(Uuid),
    /// Superusers: the whole collection.
    Everything,
}

impl Visibility {
    pub fn for_caller(caller: &Caller) -> Self {
        match caller.user() {
            None => Visibility::Public,
            Some(user) if user.is_superuser() => Visibility::Everything,
            Some(user) => Visibility::Member(user.user_id),
        }
    }

    pub fn permits(&self, status: AdStatus, creator_id: Uuid) -> bool {
        match self {
            Visibility::Everything => true,
            Visibility::Public => status != AdStatus::Draft,
            Visibility::Member(user_id) => status != AdStatus::Draft || creator_id == *user_id,
        }
    }
}
