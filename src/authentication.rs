use std::sync::Arc;

use crate::errors::RequestError;
use crate::db_helpers::{get_user_by_id, get_user_id_by_token_in_db};
use crate::{config::AppConfig, AppState};
use anyhow::{Context, Result};
use argon2::{password_hash::SaltString, Argon2, PasswordHash};
use argon2::{PasswordHasher, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::Extension;
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

const TOKEN_KEY_LENGTH: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize)]
struct AuthClaim {
    user_id: i64,
    exp: i64,
    token_type: TokenKind,
}

#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub id: i64,
}

/// The caller, if the request carried credentials. A credential that is
/// present but invalid is rejected rather than treated as anonymous.
struct MaybeUser(Option<AuthUser>);

#[axum::async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync + 'static,
{
    type Rejection = RequestError;
    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let header = match parts.headers.get("Authorization") {
            Some(header) => header,
            None => return Ok(MaybeUser(None)),
        };
        let header = match header.to_str() {
            Ok(header) => header.to_owned(),
            Err(_) => {
                tracing::debug!("authorization header is not valid ascii");
                return Err(RequestError::NotAuthorized("Invalid token"));
            }
        };

        let Extension(app) = Extension::<Arc<AppState>>::from_request_parts(parts, state)
            .await
            .map_err(|_| RequestError::ServerError)?;

        if let Some(key) = header.strip_prefix("Token ") {
            return match get_user_id_by_token_in_db(&app.pool, key.trim()).await? {
                Some(id) => Ok(MaybeUser(Some(AuthUser { id }))),
                None => {
                    tracing::debug!("unknown login token");
                    Err(RequestError::NotAuthorized("Invalid token"))
                }
            };
        }

        if let Some(token) = header.strip_prefix("Bearer ") {
            let id = verify_jwt_token(&app.config, token.trim(), TokenKind::Access)?;
            if get_user_by_id(&app.pool, id).await?.is_none() {
                tracing::debug!(user_id = id, "access token for a deleted user");
                return Err(RequestError::NotAuthorized("User not found"));
            }
            return Ok(MaybeUser(Some(AuthUser { id })));
        }

        tracing::debug!("unsupported authorization scheme");
        Err(RequestError::NotAuthorized("Invalid token"))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync + 'static,
{
    type Rejection = RequestError;
    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        match MaybeUser::from_request_parts(parts, state).await? {
            MaybeUser(Some(user)) => Ok(user),
            MaybeUser(None) => Err(RequestError::NotAuthorized(
                "Authentication credentials were not provided",
            )),
        }
    }
}

pub fn get_jwt_token(config: &AppConfig, user_id: i64, kind: TokenKind) -> Result<String> {
    let lifetime = match kind {
        TokenKind::Access => config.access_token_ttl,
        TokenKind::Refresh => config.refresh_token_ttl,
    };
    let expiry_date = OffsetDateTime::now_utc() + lifetime;
    let claim = AuthClaim {
        user_id,
        exp: expiry_date.unix_timestamp(),
        token_type: kind,
    };

    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claim,
        &jsonwebtoken::EncodingKey::from_secret(config.jwt_secret.as_ref()),
    )
    .context("Failed to generate jwt token")
}

pub fn verify_jwt_token(
    config: &AppConfig,
    token: &str,
    expected: TokenKind,
) -> Result<i64, RequestError> {
    let token_data = jsonwebtoken::decode::<AuthClaim>(
        token,
        &jsonwebtoken::DecodingKey::from_secret(config.jwt_secret.as_ref()),
        &jsonwebtoken::Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "rejected jwt");
        RequestError::NotAuthorized("Invalid Token")
    })?;
    let claim = token_data.claims;
    if claim.exp < OffsetDateTime::now_utc().unix_timestamp() {
        return Err(RequestError::NotAuthorized("Token expired"));
    }
    if claim.token_type != expected {
        return Err(RequestError::NotAuthorized("Token has wrong type"));
    }
    Ok(claim.user_id)
}

/// A fresh opaque login token.
pub fn generate_token_key() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_KEY_LENGTH)
        .map(char::from)
        .collect()
}

pub async fn verify_password_argon2(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || {
        let hash = PasswordHash::new(hash.as_str())
            .map_err(|_| anyhow::anyhow!("Failed to verify password"))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok())
    })
    .await
    .context("Failed to verify password")?
}

pub async fn hash_password_argon2(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(rand::thread_rng());
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|_| anyhow::anyhow!("Failed to hash password"))?;
        Ok(hash.to_string())
    })
    .await
    .context("Failed to hash password")?
}
