/// Task use cases
///
/// The organization of a task is always resolved through its project. Any
/// member may create, update, re-status and list tasks; only OWNER or ADMIN
/// may delete them.

use serde_json::json;
use tracing::info;

use super::error::{Resource, ServiceError, ServiceResult};
use crate::auth::authorization::{require_membership, require_role, ELEVATED_ROLES};
use crate::models::audit_log::{AuditAction, AuditEntityType, AuditEntry};
use crate::models::membership::Membership;
use crate::models::project::Project;
use crate::models::task::{CreateTask, Task, TaskFilter, TaskStatus, UpdateTask};
use crate::store::Store;

/// Task together with the caller's membership in its organization
pub(crate) struct TaskAccess {
    pub task: Task,
    pub organization_id: i64,
    pub membership: Membership,
}

async fn load_project(store: &dyn Store, project_id: i64) -> ServiceResult<Project> {
    store
        .find_project(project_id)
        .await?
        .ok_or(ServiceError::NotFound(Resource::Project))
}

/// Loads a task and checks the caller belongs to its organization
pub(crate) async fn authorized_task(
    store: &dyn Store,
    user_id: i64,
    task_id: i64,
) -> ServiceResult<TaskAccess> {
    let task = store
        .find_task(task_id)
        .await?
        .ok_or(ServiceError::NotFound(Resource::Task))?;

    let project = load_project(store, task.project_id).await?;
    let membership = require_membership(store, user_id, project.organization_id).await?;

    Ok(TaskAccess {
        task,
        organization_id: project.organization_id,
        membership,
    })
}

pub async fn create_task(
    store: &dyn Store,
    user_id: i64,
    project_id: i64,
    title: String,
    description: Option<String>,
) -> ServiceResult<Task> {
    let project = load_project(store, project_id).await?;
    require_membership(store, user_id, project.organization_id).await?;

    let audit = AuditEntry::new(user_id, AuditAction::Created, AuditEntityType::Task)
        .in_organization(project.organization_id)
        .with_metadata(json!({ "title": title, "description": description }));

    let task = store
        .create_task(
            CreateTask {
                title,
                description,
                project_id,
            },
            audit,
        )
        .await
        .map_err(|e| ServiceError::from_store(e, Resource::Project))?;

    info!(task_id = task.id, project_id, user_id, "Task created");
    Ok(task)
}

pub async fn get_task(store: &dyn Store, user_id: i64, task_id: i64) -> ServiceResult<Task> {
    Ok(authorized_task(store, user_id, task_id).await?.task)
}

/// Updates title, description and/or assignee
///
/// An assignee must be a member of the task's organization.
pub async fn update_task(
    store: &dyn Store,
    user_id: i64,
    task_id: i64,
    data: UpdateTask,
) -> ServiceResult<Task> {
    let access = authorized_task(store, user_id, task_id).await?;

    if let Some(assignee_id) = data.assignee_id {
        if store
            .find_membership(assignee_id, access.organization_id)
            .await?
            .is_none()
        {
            return Err(ServiceError::InvalidAssignee);
        }
    }

    let metadata =
        serde_json::to_value(&data).map_err(|e| ServiceError::Internal(e.to_string()))?;
    let audit = AuditEntry::new(user_id, AuditAction::Updated, AuditEntityType::Task)
        .in_organization(access.organization_id)
        .with_metadata(metadata);

    let task = store
        .update_task(task_id, data, audit)
        .await
        .map_err(|e| ServiceError::from_store(e, Resource::Task))?;

    info!(task_id, user_id, "Task updated");
    Ok(task)
}

/// Moves a task along the status graph
pub async fn change_task_status(
    store: &dyn Store,
    user_id: i64,
    task_id: i64,
    status: TaskStatus,
) -> ServiceResult<Task> {
    let access = authorized_task(store, user_id, task_id).await?;
    let current = access.task.status;

    if !current.can_transition_to(status) {
        return Err(ServiceError::InvalidStatusTransition {
            from: current,
            to: status,
        });
    }

    let audit = AuditEntry::new(user_id, AuditAction::StatusChanged, AuditEntityType::Task)
        .in_organization(access.organization_id)
        .with_metadata(json!({ "newStatus": status }));

    let task = store
        .update_task_status(task_id, status, audit)
        .await
        .map_err(|e| ServiceError::from_store(e, Resource::Task))?;

    info!(task_id, user_id, from = %current, to = %status, "Task status changed");
    Ok(task)
}

pub async fn delete_task(store: &dyn Store, user_id: i64, task_id: i64) -> ServiceResult<()> {
    let access = authorized_task(store, user_id, task_id).await?;
    require_role(&access.membership, ELEVATED_ROLES)?;

    let audit = AuditEntry::new(user_id, AuditAction::Deleted, AuditEntityType::Task)
        .in_organization(access.organization_id);

    store
        .delete_task(task_id, audit)
        .await
        .map_err(|e| ServiceError::from_store(e, Resource::Task))?;

    info!(task_id, user_id, "Task deleted");
    Ok(())
}

pub async fn list_tasks(
    store: &dyn Store,
    user_id: i64,
    filter: TaskFilter,
) -> ServiceResult<Vec<Task>> {
    let project = load_project(store, filter.project_id).await?;
    require_membership(store, user_id, project.organization_id).await?;

    Ok(store.list_tasks(&filter).await?)
}
