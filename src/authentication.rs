use anyhow::{Context, Result};
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::errors::RequestError;

/// Clients authenticate with `Authorization: Token <jwt>`.
const TOKEN_SCHEME: &str = "Token ";
const TOKEN_LIFETIME: time::Duration = time::Duration::days(90);

#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    id: i64,
    exp: i64,
}

pub struct AuthUser {
    pub id: i64,
    pub token: String,
}

/// Optional authentication: anonymous requests resolve to `MaybeUser(None)`
/// so read endpoints stay open while the viewer-dependent flags
/// (is_subscribed, is_favorited, is_in_shopping_cart) fall back to false.
/// A malformed or expired token is still rejected outright.
pub struct MaybeUser(pub Option<AuthUser>);

impl MaybeUser {
    pub fn get_id(&self) -> Option<i64> {
        self.0.as_ref().map(|user| user.id)
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync + 'static,
{
    type Rejection = RequestError;

    async fn from_request_parts(
        parts: &mut Parts,
        _: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get("Authorization") else {
            return Ok(MaybeUser(None));
        };
        let token = header
            .to_str()
            .ok()
            .and_then(|header| header.strip_prefix(TOKEN_SCHEME))
            .ok_or(RequestError::NotAuthorized("Invalid token"))?;
        let id = verify_jwt_token(token)?;
        Ok(MaybeUser(Some(AuthUser {
            id,
            token: token.to_string(),
        })))
    }
}

pub fn get_jwt_token(id: i64) -> Result<String> {
    let jwt_secret = std::env::var("JWT_SECRET").context("Failed to get JWT_SECRET")?;
    let claims = TokenClaims {
        id,
        exp: (OffsetDateTime::now_utc() + TOKEN_LIFETIME).unix_timestamp(),
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(jwt_secret.as_ref()),
    )
    .context("Failed to sign token")
}

/// Returns the user id carried by the token. `Validation::default()` already
/// checks the `exp` claim against the current time.
pub fn verify_jwt_token(token: &str) -> Result<i64, RequestError> {
    let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| RequestError::ServerError)?;
    let data = jsonwebtoken::decode::<TokenClaims>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(jwt_secret.as_ref()),
        &jsonwebtoken::Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("Rejected token: {e}");
        RequestError::NotAuthorized("Invalid token")
    })?;
    Ok(data.claims.id)
}

// Argon2 hashing is CPU-bound, so both helpers run on the blocking pool
// instead of stalling the request executor.

pub async fn hash_password_argon2(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(rand::thread_rng());
        PasswordHash::generate(Argon2::default(), password, salt.as_salt())
            .map(|hash| hash.to_string())
            .map_err(|_| anyhow::anyhow!("Failed to hash password"))
    })
    .await
    .context("Hashing task failed")?
}

pub async fn verify_password_argon2(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&hash)
            .map_err(|_| anyhow::anyhow!("Stored password hash is not parseable"))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .context("Verification task failed")?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip() {
        std::env::set_var("JWT_SECRET", "unit-test-secret");
        let token = get_jwt_token(42).unwrap();
        assert_eq!(verify_jwt_token(&token).unwrap(), 42);
    }

    #[test]
    fn garbage_token_is_rejected() {
        std::env::set_var("JWT_SECRET", "unit-test-secret");
        let result = verify_jwt_token("not-a-jwt");
        assert!(matches!(result, Err(RequestError::NotAuthorized(_))));
    }
}
