/// The caller's own profile
///
/// - `GET /api/v1/user/me`
/// - `PATCH /api/v1/user/me` with `{ "email"?, "name"? }`
///
/// Both answer `{ "success": true, "data": { id, email, name, createdAt } }`.

use crate::{app::AppState, error::ApiResult, extract::ValidJson};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;
use workboard_shared::auth::middleware::AuthContext;
use workboard_shared::models::user::{UpdateUser, UserProfile};
use workboard_shared::services::users;

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub data: UserProfile,
}

impl From<UserProfile> for ProfileResponse {
    fn from(data: UserProfile) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: Option<String>,
}

pub async fn get_me(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<ProfileResponse>> {
    let profile = users::get_profile(state.store(), auth.user_id).await?;
    Ok(Json(profile.into()))
}

pub async fn update_me(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidJson(req): ValidJson<UpdateProfileRequest>,
) -> ApiResult<Json<ProfileResponse>> {
    let profile = users::update_profile(
        state.store(),
        auth.user_id,
        UpdateUser {
            email: req.email,
            name: req.name,
        },
    )
    .await?;

    Ok(Json(profile.into()))
}
