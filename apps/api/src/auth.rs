//! Bearer-token authentication.
//!
//! Handlers take `AuthUser` as an extractor; it reads `Authorization: Bearer <token>`
//! and resolves the token through the `Authenticator` in `AppState`.

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::analysis::AnalysisError;
use crate::errors::AppError;
use crate::state::AppState;

/// Resolves a session token to a user identity. `Ok(None)` means unknown or expired.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<Option<Uuid>>;
}

/// The authenticated caller's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AnalysisError::Unauthorized)?;

        match state.authenticator.authenticate(token).await? {
            Some(user_id) => Ok(AuthUser(user_id)),
            None => {
                debug!("Rejected unknown or expired session token");
                Err(AnalysisError::Unauthorized.into())
            }
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Some(token.trim()),
        _ => {
            warn!("Malformed Authorization header");
            None
        }
    }
}

/// Hex SHA-256 of the raw token. Sessions are stored by hash only.
pub fn hash_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

/// Session lookup against `user_sessions(token_hash, user_id, expires_at)`.
#[derive(Clone)]
pub struct PgSessionAuthenticator {
    pool: PgPool,
}

impl PgSessionAuthenticator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Authenticator for PgSessionAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<Option<Uuid>> {
        let user_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM user_sessions WHERE token_hash = $1 AND expires_at > now()",
        )
        .bind(hash_token(token))
        .fetch_optional(&self.pool)
        .await?;
        Ok(user_id)
    }
}
