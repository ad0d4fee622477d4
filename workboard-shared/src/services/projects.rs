/// Project use cases
///
/// Reads and creation need membership in the project's organization;
/// update and delete additionally need OWNER or ADMIN.

use serde::Serialize;
use serde_json::json;
use tracing::info;

use super::error::{Resource, ServiceError, ServiceResult};
use crate::auth::authorization::{require_membership, require_role, ELEVATED_ROLES};
use crate::models::audit_log::{AuditAction, AuditEntityType, AuditEntry};
use crate::models::membership::Membership;
use crate::models::project::{CreateProject, Project, UpdateProject};
use crate::models::task::{NewTask, Task};
use crate::store::Store;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// One page of a keyset-paginated listing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub data: Vec<T>,

    /// Id to pass as `cursor` for the next page; `None` when exhausted
    pub next_cursor: Option<i64>,
}

/// Builds a page from up to `take + 1` rows fetched in id order
///
/// The extra row only signals that more data exists; it is dropped and its
/// id becomes the cursor of the next page.
pub fn into_page<T>(mut rows: Vec<T>, take: usize, id: impl Fn(&T) -> i64) -> Page<T> {
    let mut next_cursor = None;

    if rows.len() > take {
        rows.truncate(take + 1);
        next_cursor = rows.pop().map(|row| id(&row));
    }

    Page {
        data: rows,
        next_cursor,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectWithTasks {
    #[serde(flatten)]
    pub project: Project,
    pub tasks: Vec<Task>,
}

/// Loads a project and checks the caller belongs to its organization
async fn authorized_project(
    store: &dyn Store,
    user_id: i64,
    project_id: i64,
) -> ServiceResult<(Project, Membership)> {
    let project = store
        .find_project(project_id)
        .await?
        .ok_or(ServiceError::NotFound(Resource::Project))?;

    let membership = require_membership(store, user_id, project.organization_id).await?;
    Ok((project, membership))
}

/// Creates a project and its initial tasks in one unit
pub async fn create_project(
    store: &dyn Store,
    user_id: i64,
    name: String,
    description: Option<String>,
    organization_id: i64,
    tasks: Vec<NewTask>,
) -> ServiceResult<ProjectWithTasks> {
    require_membership(store, user_id, organization_id).await?;

    let audit = AuditEntry::new(user_id, AuditAction::Created, AuditEntityType::Project)
        .in_organization(organization_id)
        .with_metadata(json!({
            "name": name,
            "description": description,
            "taskCount": tasks.len(),
        }));

    let (project, tasks) = store
        .create_project(
            CreateProject {
                name,
                description,
                organization_id,
            },
            tasks,
            audit,
        )
        .await
        .map_err(|e| ServiceError::from_store(e, Resource::Organization))?;

    info!(project_id = project.id, organization_id, user_id, "Project created");
    Ok(ProjectWithTasks { project, tasks })
}

pub async fn get_project(
    store: &dyn Store,
    user_id: i64,
    project_id: i64,
) -> ServiceResult<Project> {
    let (project, _) = authorized_project(store, user_id, project_id).await?;
    Ok(project)
}

pub async fn update_project(
    store: &dyn Store,
    user_id: i64,
    project_id: i64,
    data: UpdateProject,
) -> ServiceResult<Project> {
    let (project, membership) = authorized_project(store, user_id, project_id).await?;
    require_role(&membership, ELEVATED_ROLES)?;

    let metadata =
        serde_json::to_value(&data).map_err(|e| ServiceError::Internal(e.to_string()))?;
    let audit = AuditEntry::new(user_id, AuditAction::Updated, AuditEntityType::Project)
        .in_organization(project.organization_id)
        .with_metadata(metadata);

    let updated = store
        .update_project(project_id, data, audit)
        .await
        .map_err(|e| ServiceError::from_store(e, Resource::Project))?;

    info!(project_id, user_id, "Project updated");
    Ok(updated)
}

pub async fn delete_project(store: &dyn Store, user_id: i64, project_id: i64) -> ServiceResult<()> {
    let (project, membership) = authorized_project(store, user_id, project_id).await?;
    require_role(&membership, ELEVATED_ROLES)?;

    let audit = AuditEntry::new(user_id, AuditAction::Deleted, AuditEntityType::Project)
        .in_organization(project.organization_id);

    store
        .delete_project(project_id, audit)
        .await
        .map_err(|e| ServiceError::from_store(e, Resource::Project))?;

    info!(project_id, user_id, "Project deleted");
    Ok(())
}

/// Lists an organization's projects by ascending id
///
/// `cursor` is the `nextCursor` of the previous page and is inclusive.
pub async fn list_projects(
    store: &dyn Store,
    user_id: i64,
    organization_id: i64,
    cursor: Option<i64>,
    take: Option<i64>,
) -> ServiceResult<Page<Project>> {
    let take = take.unwrap_or(DEFAULT_PAGE_SIZE);
    if !(1..=MAX_PAGE_SIZE).contains(&take) {
        return Err(ServiceError::Validation(format!(
            "take must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }

    require_membership(store, user_id, organization_id).await?;

    let rows = store.list_projects(organization_id, cursor, take + 1).await?;
    Ok(into_page(rows, take as usize, |p| p.id))
}
