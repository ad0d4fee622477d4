/// Organization tags and their attachment to tasks
///
/// A tag can only be attached to tasks of its own organization; a tag from
/// another organization is reported as not found.

use serde_json::json;
use tracing::info;

use super::error::{Resource, ServiceError, ServiceResult};
use super::tasks::{authorized_task, TaskAccess};
use crate::auth::authorization::require_membership;
use crate::models::audit_log::{AuditAction, AuditEntityType, AuditEntry};
use crate::models::tag::{CreateTag, Tag, TaskTag};
use crate::store::{constraints, Store, StoreError};

pub async fn create_tag(
    store: &dyn Store,
    user_id: i64,
    organization_id: i64,
    name: String,
) -> ServiceResult<Tag> {
    require_membership(store, user_id, organization_id).await?;

    let audit = AuditEntry::new(user_id, AuditAction::Created, AuditEntityType::Tag)
        .in_organization(organization_id)
        .with_metadata(json!({ "name": name }));

    let tag = store
        .create_tag(
            CreateTag {
                name,
                organization_id,
            },
            audit,
        )
        .await
        .map_err(|e| ServiceError::from_store(e, Resource::Organization))?;

    info!(tag_id = tag.id, organization_id, user_id, "Tag created");
    Ok(tag)
}

pub async fn list_tags(
    store: &dyn Store,
    user_id: i64,
    organization_id: i64,
) -> ServiceResult<Vec<Tag>> {
    require_membership(store, user_id, organization_id).await?;
    Ok(store.list_tags(organization_id).await?)
}

/// Resolves task access and a tag of the same organization
async fn task_and_tag(
    store: &dyn Store,
    user_id: i64,
    task_id: i64,
    tag_id: i64,
) -> ServiceResult<(TaskAccess, Tag)> {
    let access = authorized_task(store, user_id, task_id).await?;

    let tag = store
        .find_tag(tag_id)
        .await?
        .filter(|tag| tag.organization_id == access.organization_id)
        .ok_or(ServiceError::NotFound(Resource::Tag))?;

    Ok((access, tag))
}

pub async fn attach_tag(
    store: &dyn Store,
    user_id: i64,
    task_id: i64,
    tag_id: i64,
) -> ServiceResult<TaskTag> {
    let (access, tag) = task_and_tag(store, user_id, task_id, tag_id).await?;

    let audit = AuditEntry::new(user_id, AuditAction::Attached, AuditEntityType::Tag)
        .in_organization(access.organization_id)
        .with_metadata(json!({ "taskId": task_id }));

    let task_tag = store
        .attach_tag(task_id, tag.id, audit)
        .await
        .map_err(|e| match e {
            StoreError::Conflict(ref c) if c == constraints::TASK_TAG => {
                ServiceError::Conflict("Tag is already attached to this task".to_string())
            }
            other => ServiceError::from_store(other, Resource::Task),
        })?;

    info!(tag_id, task_id, user_id, "Tag attached");
    Ok(task_tag)
}

pub async fn detach_tag(
    store: &dyn Store,
    user_id: i64,
    task_id: i64,
    tag_id: i64,
) -> ServiceResult<()> {
    let (access, tag) = task_and_tag(store, user_id, task_id, tag_id).await?;

    let audit = AuditEntry::new(user_id, AuditAction::Detached, AuditEntityType::Tag)
        .in_organization(access.organization_id)
        .with_metadata(json!({ "taskId": task_id }));

    if !store.detach_tag(task_id, tag.id, audit).await? {
        return Err(ServiceError::TagNotAttached);
    }

    info!(tag_id, task_id, user_id, "Tag detached");
    Ok(())
}
