/// Project endpoints
///
/// - `POST /api/v1/projects` - Create, optionally with initial tasks (201)
/// - `GET /api/v1/projects/:id`
/// - `PUT /api/v1/projects/:id` - OWNER/ADMIN only
/// - `DELETE /api/v1/projects/:id` - OWNER/ADMIN only
/// - `GET /api/v1/projects/organization/:organization_id?cursor&take`
///
/// # Pagination
///
/// Listing is keyset paginated by ascending id. The response carries
/// `nextCursor`, which is passed back verbatim as `cursor` for the next page
/// and is `null` once the listing is exhausted.
///
/// ```json
/// { "data": [ { "id": 1, "name": "Launch" } ], "nextCursor": 2 }
/// ```

use crate::{
    app::AppState,
    error::{validation_details, ApiError, ApiResult},
    extract::{ValidJson, ValidPath, ValidQuery},
    routes::MessageResponse,
};
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use validator::Validate;
use workboard_shared::auth::middleware::AuthContext;
use workboard_shared::models::project::{Project, UpdateProject};
use workboard_shared::models::task::NewTask;
use workboard_shared::services::projects::{self, Page, ProjectWithTasks};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    pub organization_id: i64,

    #[serde(default)]
    pub tasks: Vec<NewTaskRequest>,
}

/// Task created alongside its project
#[derive(Debug, Deserialize, Validate)]
pub struct NewTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
}

impl CreateProjectRequest {
    /// Validates each initial task, reporting fields as `tasks[i].title`
    fn validate_tasks(&self) -> Result<(), ApiError> {
        let details: Vec<_> = self
            .tasks
            .iter()
            .enumerate()
            .filter_map(|(i, task)| task.validate().err().map(|e| (i, e)))
            .flat_map(|(i, errors)| validation_details(&errors, &format!("tasks[{}].", i)))
            .collect();

        if details.is_empty() {
            Ok(())
        } else {
            Err(ApiError::ValidationError(details))
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProjectRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ListProjectsQuery {
    pub cursor: Option<i64>,

    #[validate(range(min = 1, max = 100, message = "take must be between 1 and 100"))]
    pub take: Option<i64>,
}

pub async fn create_project(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidJson(req): ValidJson<CreateProjectRequest>,
) -> ApiResult<(StatusCode, Json<ProjectWithTasks>)> {
    req.validate_tasks()?;

    let tasks = req
        .tasks
        .into_iter()
        .map(|task| NewTask {
            title: task.title,
            description: task.description,
        })
        .collect();

    let created = projects::create_project(
        state.store(),
        auth.user_id,
        req.name,
        req.description,
        req.organization_id,
        tasks,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_project(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidPath(id): ValidPath<i64>,
) -> ApiResult<Json<Project>> {
    Ok(Json(projects::get_project(state.store(), auth.user_id, id).await?))
}

pub async fn update_project(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidPath(id): ValidPath<i64>,
    ValidJson(req): ValidJson<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    let project = projects::update_project(
        state.store(),
        auth.user_id,
        id,
        UpdateProject {
            name: req.name,
            description: req.description,
        },
    )
    .await?;

    Ok(Json(project))
}

pub async fn delete_project(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidPath(id): ValidPath<i64>,
) -> ApiResult<Json<MessageResponse>> {
    projects::delete_project(state.store(), auth.user_id, id).await?;
    Ok(Json(MessageResponse::new("Project deleted")))
}

pub async fn list_projects(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidPath(organization_id): ValidPath<i64>,
    ValidQuery(query): ValidQuery<ListProjectsQuery>,
) -> ApiResult<Json<Page<Project>>> {
    let page = projects::list_projects(
        state.store(),
        auth.user_id,
        organization_id,
        query.cursor,
        query.take,
    )
    .await?;

    Ok(Json(page))
}
