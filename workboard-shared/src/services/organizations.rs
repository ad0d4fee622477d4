/// Organizations, invitations and membership on-boarding

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};

use super::error::{Resource, ServiceError, ServiceResult};
use crate::auth::authorization::{require_membership, require_role, ELEVATED_ROLES};
use crate::models::audit_log::{AuditAction, AuditEntityType, AuditEntry};
use crate::models::invitation::{
    expiry_from, generate_token, CreateInvitation, Invitation, InvitationRejection,
};
use crate::models::membership::MembershipRole;
use crate::models::organization::{slug_candidate, slugify, CreateOrganization, Organization};
use crate::store::{constraints, AcceptOutcome, Store, StoreError};

/// Upper bound on suffixed slug candidates tried for one name
pub const MAX_SLUG_ATTEMPTS: u32 = 1000;

/// Creates an organization owned by `user_id`
///
/// The slug comes from the name; taken slugs get `-1`, `-2`, ... appended.
/// A unique violation from a concurrent creation moves on to the next
/// candidate.
pub async fn create_organization(
    store: &dyn Store,
    user_id: i64,
    name: String,
) -> ServiceResult<Organization> {
    let base = slugify(&name);

    for attempt in 0..MAX_SLUG_ATTEMPTS {
        let slug = slug_candidate(&base, attempt);

        if store.find_organization_by_slug(&slug).await?.is_some() {
            continue;
        }

        let audit = AuditEntry::new(user_id, AuditAction::Created, AuditEntityType::Organization)
            .with_metadata(json!({ "name": name }));
        let data = CreateOrganization {
            name: name.clone(),
            slug: slug.clone(),
        };

        match store.create_organization(data, user_id, audit).await {
            Ok(organization) => {
                info!(
                    organization_id = organization.id,
                    slug = %organization.slug,
                    user_id,
                    "Organization created"
                );
                return Ok(organization);
            }
            Err(StoreError::Conflict(ref c)) if c == constraints::ORGANIZATION_SLUG => {
                debug!(slug = %slug, "Slug taken concurrently, retrying");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(ServiceError::Conflict(format!(
        "Could not find a free slug for '{}'",
        name
    )))
}

pub async fn list_user_organizations(
    store: &dyn Store,
    user_id: i64,
) -> ServiceResult<Vec<Organization>> {
    Ok(store.list_organizations_for_user(user_id).await?)
}

/// Invites `email` into the organization identified by `slug`
///
/// Requires OWNER or ADMIN. Repeated invitations for the same address are
/// allowed; each carries its own token.
pub async fn invite_member(
    store: &dyn Store,
    user_id: i64,
    slug: &str,
    email: String,
    role: MembershipRole,
) -> ServiceResult<Invitation> {
    let organization = store
        .find_organization_by_slug(slug)
        .await?
        .ok_or(ServiceError::NotFound(Resource::Organization))?;

    let membership = require_membership(store, user_id, organization.id).await?;
    require_role(&membership, ELEVATED_ROLES)?;

    let audit = AuditEntry::new(user_id, AuditAction::MemberInvited, AuditEntityType::Organization)
        .in_organization(organization.id)
        .with_metadata(json!({ "email": email, "role": role }));

    let invitation = store
        .create_invitation(
            CreateInvitation {
                email,
                role,
                organization_id: organization.id,
                token: generate_token(),
                expires_at: expiry_from(Utc::now()),
            },
            audit,
        )
        .await?;

    info!(
        invitation_id = invitation.id,
        organization_id = organization.id,
        user_id,
        "Invitation created"
    );
    Ok(invitation)
}

/// Redeems an invitation token for `user_id`
pub async fn accept_invite(
    store: &dyn Store,
    user_id: i64,
    token: &str,
) -> ServiceResult<Invitation> {
    let invitation = store
        .find_invitation_by_token(token)
        .await?
        .ok_or(ServiceError::NotFound(Resource::Invitation))?;

    let audit = AuditEntry::new(user_id, AuditAction::MemberJoined, AuditEntityType::Organization)
        .with_metadata(json!({ "invitationId": invitation.id }));

    match store.accept_invitation(token, user_id, Utc::now(), audit).await {
        Ok(AcceptOutcome::Accepted(accepted)) => {
            info!(
                invitation_id = accepted.id,
                organization_id = accepted.organization_id,
                user_id,
                "Invitation accepted"
            );
            Ok(accepted)
        }
        Ok(AcceptOutcome::NotFound) => Err(ServiceError::NotFound(Resource::Invitation)),
        Ok(AcceptOutcome::Rejected(InvitationRejection::AlreadyUsed)) => {
            Err(ServiceError::InvitationAlreadyUsed)
        }
        Ok(AcceptOutcome::Rejected(InvitationRejection::Expired)) => {
            Err(ServiceError::InvitationExpired)
        }
        Ok(AcceptOutcome::AlreadyMember) => Err(ServiceError::AlreadyMember),
        Err(StoreError::Conflict(ref c)) if c == constraints::MEMBERSHIP => {
            Err(ServiceError::AlreadyMember)
        }
        Err(e) => Err(e.into()),
    }
}
