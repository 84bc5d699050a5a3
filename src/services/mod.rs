pub mod advertisement_service;
pub mod favorite_service;
