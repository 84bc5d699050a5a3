use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderValue, header, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::{dto::auth::Claims, error::AppError, state::AppState};

pub const ROLE_USER: &str = "user";
pub const ROLE_SUPERUSER: &str = "superuser";

/// Identity proven by a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
    pub role: String,
}

impl AuthUser {
    pub fn is_superuser(&self) -> bool {
        self.role == ROLE_SUPERUSER
    }
}

/// Whoever is making the request, signed in or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    Anonymous,
    Authenticated(AuthUser),
}

impl Caller {
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            Caller::Anonymous => None,
            Caller::Authenticated(user) => Some(user),
        }
    }

    pub fn is_superuser(&self) -> bool {
        self.user().is_some_and(AuthUser::is_superuser)
    }
}

impl From<AuthUser> for Caller {
    fn from(user: AuthUser) -> Self {
        Caller::Authenticated(user)
    }
}

/// Signs a token for `user`. Used by the seeding tool and tests; issuing
/// tokens to end users belongs to the identity provider.
pub fn encode_token(secret: &str, user: &AuthUser, ttl: Duration) -> Result<String, AppError> {
    let expiration = Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user.user_id.to_string(),
        username: user.username.clone(),
        role: user.role.clone(),
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

fn decode_bearer(value: &HeaderValue, secret: &str) -> Result<AuthUser, AppError> {
    let auth_str = value.to_str().map_err(|_| AppError::Unauthorized)?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or(AppError::Unauthorized)?;

    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|err| {
        tracing::debug!(error = %err, "rejected bearer token");
        AppError::Unauthorized
    })?;

    let user_id = Uuid::parse_str(&decoded.claims.sub).map_err(|_| AppError::Unauthorized)?;

    Ok(AuthUser {
        user_id,
        username: decoded.claims.username,
        role: decoded.claims.role,
    })
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let value = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::Unauthorized)?;
        decode_bearer(value, &state.jwt_secret)
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        match parts.headers.get(header::AUTHORIZATION) {
            None => Ok(Caller::Anonymous),
            Some(value) => decode_bearer(value, &state.jwt_secret).map(Caller::Authenticated),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn alice() -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            username: "alice".into(),
            role: ROLE_USER.into(),
        }
    }

    #[test]
    fn bearer_token_round_trips_identity() {
        let user = alice();
        let token = encode_token(SECRET, &user, Duration::hours(1)).unwrap();
        let value = HeaderValue::from_str(&format!("Bearer {token}")).unwrap();
        assert_eq!(decode_bearer(&value, SECRET).unwrap(), user);
    }

    #[test]
    fn wrong_secret_or_scheme_is_unauthorized() {
        let token = encode_token(SECRET, &alice(), Duration::hours(1)).unwrap();

        let value = HeaderValue::from_str(&format!("Bearer {token}")).unwrap();
        assert!(matches!(
            decode_bearer(&value, "other-secret"),
            Err(AppError::Unauthorized)
        ));

        let value = HeaderValue::from_str(&format!("Token {token}")).unwrap();
        assert!(matches!(
            decode_bearer(&value, SECRET),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn expired_token_is_unauthorized() {
        let token = encode_token(SECRET, &alice(), Duration::hours(-2)).unwrap();
        let value = HeaderValue::from_str(&format!("Bearer {token}")).unwrap();
        assert!(matches!(
            decode_bearer(&value, SECRET),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn superuser_role_is_privileged() {
        let mut user = alice();
        assert!(!Caller::from(user.clone()).is_superuser());
        user.role = ROLE_SUPERUSER.into();
        assert!(Caller::from(user).is_superuser());
        assert!(!Caller::Anonymous.is_superuser());
    }
}
