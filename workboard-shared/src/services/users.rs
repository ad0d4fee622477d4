use tracing::info;

use super::error::{Resource, ServiceError, ServiceResult};
use crate::models::audit_log::{AuditAction, AuditEntityType, AuditEntry};
use crate::models::user::{UpdateUser, UserProfile};
use crate::store::{constraints, Store, StoreError};

pub async fn get_profile(store: &dyn Store, user_id: i64) -> ServiceResult<UserProfile> {
    store
        .find_user_by_id(user_id)
        .await?
        .map(UserProfile::from)
        .ok_or(ServiceError::NotFound(Resource::User))
}

/// Updates email and/or name; records `UPDATED/USER` with the submitted fields
pub async fn update_profile(
    store: &dyn Store,
    user_id: i64,
    data: UpdateUser,
) -> ServiceResult<UserProfile> {
    if store.find_user_by_id(user_id).await?.is_none() {
        return Err(ServiceError::NotFound(Resource::User));
    }

    if let Some(ref email) = data.email {
        if let Some(existing) = store.find_user_by_email(email).await? {
            if existing.id != user_id {
                return Err(ServiceError::UserAlreadyExists);
            }
        }
    }

    let metadata =
        serde_json::to_value(&data).map_err(|e| ServiceError::Internal(e.to_string()))?;
    let audit = AuditEntry::new(user_id, AuditAction::Updated, AuditEntityType::User)
        .with_metadata(metadata);

    let user = store
        .update_user(user_id, data, audit)
        .await
        .map_err(|e| match e {
            StoreError::Conflict(ref c) if c == constraints::USER_EMAIL => {
                ServiceError::UserAlreadyExists
            }
            other => ServiceError::from_store(other, Resource::User),
        })?;

    info!(user_id, "Profile updated");
    Ok(user.into())
}
