use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use thiserror::Error;

use crate::db::parse_timestamp;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing token")]
    MissingToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    Expired,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Resolve a bearer token to its user. Tokens are stored hashed.
pub async fn verify_token(
    pool: &SqlitePool,
    token: &str,
    now: DateTime<Utc>,
) -> Result<AuthUser, AuthError> {
    let row: Option<(String, Option<String>)> = sqlx::query_as(
        r#"SELECT "userId", "expiresAt" FROM "user_tokens" WHERE "tokenHash" = ?"#,
    )
    .bind(hash_token(token))
    .fetch_optional(pool)
    .await?;

    let Some((user_id, expires_at)) = row else {
        return Err(AuthError::InvalidToken);
    };

    if let Some(raw) = expires_at {
        let expires_at = parse_timestamp(&raw).map_err(|_| AuthError::InvalidToken)?;
        if expires_at <= now {
            return Err(AuthError::Expired);
        }
    }

    Ok(AuthUser { id: user_id })
}
