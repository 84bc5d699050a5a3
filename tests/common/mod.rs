#![allow(dead_code)]

use std::sync::Arc;

use chrono::Duration;
use classifieds_api::{
    middleware::auth::{AuthUser, ROLE_SUPERUSER, ROLE_USER, encode_token},
    state::AppState,
    store::{MemoryStore, NewUser, UserStore},
};
use uuid::Uuid;

pub const SECRET: &str = "integration-secret";

pub fn memory_state() -> AppState {
    AppState::new(Arc::new(MemoryStore::new()), SECRET)
}

pub async fn register(state: &AppState, username: &str, role: &str) -> AuthUser {
    let user = state
        .store
        .upsert_user(NewUser {
            id: Uuid::new_v4(),
            username: username.to_string(),
            first_name: username.to_string(),
            last_name: String::new(),
            role: role.to_string(),
        })
        .await
        .expect("register user");

    AuthUser {
        user_id: user.id,
        username: user.username,
        role: role.to_string(),
    }
}

pub async fn member(state: &AppState, username: &str) -> AuthUser {
    register(state, username, ROLE_USER).await
}

pub async fn superuser(state: &AppState, username: &str) -> AuthUser {
    register(state, username, ROLE_SUPERUSER).await
}

pub fn bearer(user: &AuthUser) -> String {
    let token = encode_token(SECRET, user, Duration::hours(1)).expect("encode token");
    format!("Bearer {token}")
}
