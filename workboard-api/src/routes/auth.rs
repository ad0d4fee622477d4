/// Authentication endpoints
///
/// - `POST /api/v1/auth/signup` - Register and receive tokens (201)
/// - `POST /api/v1/auth/login` - Exchange credentials for tokens
/// - `POST /api/v1/auth/refresh` - Rotate a refresh token
///
/// All three answer `{ "accessToken": "...", "refreshToken": "..." }`.

use crate::{app::AppState, error::ApiResult, extract::ValidJson};
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use validator::Validate;
use workboard_shared::services::auth::{self, TokenPair};

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

pub async fn signup(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<SignupRequest>,
) -> ApiResult<(StatusCode, Json<TokenPair>)> {
    let tokens = auth::signup(
        state.store(),
        &state.config.jwt,
        req.email,
        req.password,
        req.name,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(tokens)))
}

pub async fn login(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> ApiResult<Json<TokenPair>> {
    let tokens = auth::login(state.store(), &state.config.jwt, &req.email, req.password).await?;
    Ok(Json(tokens))
}

pub async fn refresh(
    State(state): State<AppState>,
    ValidJson(req): ValidJson<RefreshRequest>,
) -> ApiResult<Json<TokenPair>> {
    let tokens = auth::refresh(state.store(), &state.config.jwt, &req.refresh_token).await?;
    Ok(Json(tokens))
}
