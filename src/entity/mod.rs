pub mod advertisements;
pub mod favorites;
pub mod users;

pub use advertisements::Entity as Advertisements;
pub use favorites::Entity as Favorites;
pub use users::Entity as Users;
