/// Organization and invitation endpoints
///
/// - `POST /api/v1/organizations` `{name}` - Create, caller becomes OWNER (201)
/// - `GET /api/v1/organizations` - Organizations the caller belongs to
/// - `POST /api/v1/organizations/:slug/invite` `{email, role}` - OWNER/ADMIN only (201)
/// - `POST /api/v1/organizations/accept-invite` `{token}` - Redeem an invitation

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ValidJson, ValidPath},
};
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use validator::{Validate, ValidationError};
use workboard_shared::auth::middleware::AuthContext;
use workboard_shared::models::invitation::Invitation;
use workboard_shared::models::membership::MembershipRole;
use workboard_shared::models::organization::Organization;
use workboard_shared::services::organizations;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrganizationRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct InviteRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub role: MembershipRole,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AcceptInviteRequest {
    #[validate(custom(function = "validate_invitation_token"))]
    pub token: String,
}

/// Invitation tokens are 64 lowercase hex characters
fn validate_invitation_token(token: &str) -> Result<(), ValidationError> {
    let well_formed = token.len() == 64
        && token
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));

    if well_formed {
        Ok(())
    } else {
        let mut error = ValidationError::new("invitation_token");
        error.message = Some("Token must be 64 lowercase hex characters".into());
        Err(error)
    }
}

pub async fn create_organization(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidJson(req): ValidJson<CreateOrganizationRequest>,
) -> ApiResult<(StatusCode, Json<Organization>)> {
    let organization =
        organizations::create_organization(state.store(), auth.user_id, req.name).await?;
    Ok((StatusCode::CREATED, Json(organization)))
}

pub async fn list_organizations(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<Organization>>> {
    let organizations = organizations::list_user_organizations(state.store(), auth.user_id).await?;
    Ok(Json(organizations))
}

pub async fn invite_member(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidPath(slug): ValidPath<String>,
    ValidJson(req): ValidJson<InviteRequest>,
) -> ApiResult<(StatusCode, Json<Invitation>)> {
    let invitation =
        organizations::invite_member(state.store(), auth.user_id, &slug, req.email, req.role)
            .await?;
    Ok((StatusCode::CREATED, Json(invitation)))
}

pub async fn accept_invite(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidJson(req): ValidJson<AcceptInviteRequest>,
) -> ApiResult<Json<Invitation>> {
    let invitation = organizations::accept_invite(state.store(), auth.user_id, &req.token).await?;
    Ok(Json(invitation))
}
