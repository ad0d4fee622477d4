use serde_json::json;
use tracing::info;

use super::error::{Resource, ServiceError, ServiceResult};
use super::tasks::authorized_task;
use crate::auth::authorization::{require_author_or_role, ELEVATED_ROLES};
use crate::models::audit_log::{AuditAction, AuditEntityType, AuditEntry};
use crate::models::comment::{Comment, CreateComment};
use crate::store::Store;

/// Adds a comment to a task; any member of the task's organization may comment
pub async fn create_comment(
    store: &dyn Store,
    user_id: i64,
    task_id: i64,
    content: String,
) -> ServiceResult<Comment> {
    let access = authorized_task(store, user_id, task_id).await?;

    let audit = AuditEntry::new(user_id, AuditAction::Created, AuditEntityType::Comment)
        .in_organization(access.organization_id)
        .with_metadata(json!({ "taskId": task_id, "content": content }));

    let comment = store
        .create_comment(
            CreateComment {
                content,
                task_id,
                author_id: user_id,
            },
            audit,
        )
        .await
        .map_err(|e| ServiceError::from_store(e, Resource::Task))?;

    info!(comment_id = comment.id, task_id, user_id, "Comment created");
    Ok(comment)
}

/// Deletes a comment; allowed for its author or an OWNER/ADMIN
pub async fn delete_comment(store: &dyn Store, user_id: i64, comment_id: i64) -> ServiceResult<()> {
    let comment = store
        .find_comment(comment_id)
        .await?
        .ok_or(ServiceError::NotFound(Resource::Comment))?;

    let access = authorized_task(store, user_id, comment.task_id).await?;
    require_author_or_role(&access.membership, comment.author_id, ELEVATED_ROLES)?;

    let audit = AuditEntry::new(user_id, AuditAction::Deleted, AuditEntityType::Comment)
        .in_organization(access.organization_id);

    store
        .delete_comment(comment_id, audit)
        .await
        .map_err(|e| ServiceError::from_store(e, Resource::Comment))?;

    info!(comment_id, user_id, "Comment deleted");
    Ok(())
}
