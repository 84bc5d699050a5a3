pub mod advertisements;
pub mod auth;
pub mod favorites;
