/// Signup, login and refresh-token rotation
///
/// A user holds one live refresh token at a time. Login and refresh both
/// mint a fresh pair and replace the stored digest, so a rotated refresh
/// token cannot be replayed.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::error::{ServiceError, ServiceResult};
use crate::auth::jwt::{JwtSettings, TokenType};
use crate::auth::password::{hash_password, verify_password};
use crate::models::refresh_token::{hash_token, NewRefreshToken};
use crate::models::user::CreateUser;
use crate::store::{constraints, Store, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

async fn hash_in_background(password: String) -> ServiceResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))?
        .map_err(|e| ServiceError::Internal(e.to_string()))
}

async fn verify_in_background(password: String, hash: String) -> ServiceResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| ServiceError::Internal(e.to_string()))?
        .map_err(|e| ServiceError::Internal(e.to_string()))
}

/// Mints an access/refresh pair and stores the refresh digest
async fn issue_tokens(
    store: &dyn Store,
    jwt: &JwtSettings,
    user_id: i64,
) -> ServiceResult<TokenPair> {
    let (access_token, _) = jwt
        .issue(user_id, TokenType::Access)
        .map_err(|e| ServiceError::Internal(e.to_string()))?;
    let (refresh_token, refresh_claims) = jwt
        .issue(user_id, TokenType::Refresh)
        .map_err(|e| ServiceError::Internal(e.to_string()))?;

    store
        .replace_refresh_tokens(NewRefreshToken {
            token_hash: hash_token(&refresh_token),
            user_id,
            expires_at: refresh_claims.expires_at(),
        })
        .await?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

pub async fn signup(
    store: &dyn Store,
    jwt: &JwtSettings,
    email: String,
    password: String,
    name: Option<String>,
) -> ServiceResult<TokenPair> {
    if store.find_user_by_email(&email).await?.is_some() {
        return Err(ServiceError::UserAlreadyExists);
    }

    let password_hash = hash_in_background(password).await?;

    let user = store
        .create_user(CreateUser {
            email,
            password_hash,
            name,
        })
        .await
        .map_err(|e| match e {
            StoreError::Conflict(ref c) if c == constraints::USER_EMAIL => {
                ServiceError::UserAlreadyExists
            }
            other => other.into(),
        })?;

    info!(user_id = user.id, "User signed up");
    issue_tokens(store, jwt, user.id).await
}

pub async fn login(
    store: &dyn Store,
    jwt: &JwtSettings,
    email: &str,
    password: String,
) -> ServiceResult<TokenPair> {
    let Some(user) = store.find_user_by_email(email).await? else {
        return Err(ServiceError::InvalidCredentials);
    };

    if !verify_in_background(password, user.password_hash.clone()).await? {
        warn!(user_id = user.id, "Login rejected: wrong password");
        return Err(ServiceError::InvalidCredentials);
    }

    info!(user_id = user.id, "User logged in");
    issue_tokens(store, jwt, user.id).await
}

/// Exchanges a live refresh token for a new pair
pub async fn refresh(
    store: &dyn Store,
    jwt: &JwtSettings,
    refresh_token: &str,
) -> ServiceResult<TokenPair> {
    let claims = jwt
        .validate_refresh_token(refresh_token)
        .map_err(|_| ServiceError::InvalidToken)?;

    let stored = store
        .find_refresh_token(&hash_token(refresh_token))
        .await?
        .ok_or(ServiceError::InvalidToken)?;

    if stored.user_id != claims.sub || stored.is_expired(Utc::now()) {
        return Err(ServiceError::InvalidToken);
    }

    issue_tokens(store, jwt, stored.user_id).await
}
