/// Organization access checks
///
/// Every organization-scoped operation resolves the caller's membership
/// first and then, for privileged actions, checks the role.
///
/// # Permission model
///
/// 1. **Membership**: no membership row means no access at all, reads included
/// 2. **Elevated roles**: OWNER and ADMIN are equally privileged; MEMBER is not
/// 3. **Authorship**: comment deletion also admits the comment's author
///
/// There is no role ordering and no bypass.

use tracing::warn;

use crate::models::membership::{Membership, MembershipRole};
use crate::store::{Store, StoreError};

/// Roles allowed to perform privileged actions
pub const ELEVATED_ROLES: &[MembershipRole] = &[MembershipRole::Owner, MembershipRole::Admin];

#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// No membership row for the organization
    #[error("Not a member of organization {0}")]
    NotMember(i64),

    #[error("Insufficient permissions: role {actual} not in {allowed:?}")]
    InsufficientRole {
        allowed: &'static [MembershipRole],
        actual: MembershipRole,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Returns the caller's membership or fails with `NotMember`
pub async fn require_membership(
    store: &dyn Store,
    user_id: i64,
    organization_id: i64,
) -> Result<Membership, AuthzError> {
    match store.find_membership(user_id, organization_id).await? {
        Some(membership) => Ok(membership),
        None => {
            warn!(user_id, organization_id, "access denied: not a member");
            Err(AuthzError::NotMember(organization_id))
        }
    }
}

/// Checks that the membership's role is one of `allowed`
pub fn require_role(
    membership: &Membership,
    allowed: &'static [MembershipRole],
) -> Result<(), AuthzError> {
    if allowed.contains(&membership.role) {
        return Ok(());
    }

    warn!(
        user_id = membership.user_id,
        organization_id = membership.organization_id,
        role = %membership.role,
        "forbidden: insufficient role"
    );
    Err(AuthzError::InsufficientRole {
        allowed,
        actual: membership.role,
    })
}

/// Passes if the caller authored the resource or holds one of `allowed`
pub fn require_author_or_role(
    membership: &Membership,
    author_id: i64,
    allowed: &'static [MembershipRole],
) -> Result<(), AuthzError> {
    if membership.user_id == author_id {
        return Ok(());
    }

    require_role(membership, allowed)
}
