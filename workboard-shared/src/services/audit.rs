use super::error::ServiceResult;
use crate::auth::authorization::require_membership;
use crate::models::audit_log::{AuditFilter, AuditLog, AUDIT_LIST_LIMIT};
use crate::store::Store;

/// Lists audit entries visible to `user_id`, newest first, at most 50
///
/// With `organization_id` set the caller must be a member and sees every
/// entry of that organization. Without it the caller only sees entries they
/// authored.
pub async fn list_audit_logs(
    store: &dyn Store,
    user_id: i64,
    mut filter: AuditFilter,
) -> ServiceResult<Vec<AuditLog>> {
    match filter.organization_id {
        Some(organization_id) => {
            require_membership(store, user_id, organization_id).await?;
        }
        None => filter.user_id = Some(user_id),
    }

    Ok(store.list_audit_logs(&filter, AUDIT_LIST_LIMIT).await?)
}
