//! Classifieds listing service.
//!
//! Advertisements carry a status and a creator. What a caller may read
//! depends on who they are ([`policy::visibility`]), what they may change
//! depends on ownership ([`policy::access`]), and how many advertisements a
//! creator may keep open is capped ([`policy::quota`]). Favorites are a
//! per-user bookmark list with one entry per advertisement and no
//! self-favoriting.

pub mod config;
pub mod db;
pub mod dto;
pub mod entity;
pub mod error;
pub mod middleware;
pub mod models;
pub mod policy;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
