/// Task endpoints
///
/// - `POST /api/v1/tasks` `{projectId, title, description?}` (201)
/// - `GET /api/v1/tasks?projectId&status&assigneeId&sort&order`
/// - `GET /api/v1/tasks/:id`
/// - `PATCH /api/v1/tasks/:id` `{title?, description?, assigneeId?}`
/// - `PATCH /api/v1/tasks/:id/status` `{status}`
/// - `DELETE /api/v1/tasks/:id` - OWNER/ADMIN only
///
/// Status moves `TODO → IN_PROGRESS → DONE` and may reopen
/// `DONE → IN_PROGRESS`; anything else is `INVALID_STATUS_TRANSITION`.

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ValidJson, ValidPath, ValidQuery},
    routes::MessageResponse,
};
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use validator::Validate;
use workboard_shared::auth::middleware::AuthContext;
use workboard_shared::models::task::{SortOrder, Task, TaskFilter, TaskSort, TaskStatus, UpdateTask};
use workboard_shared::services::tasks;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub project_id: i64,

    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    pub assignee_id: Option<i64>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangeStatusRequest {
    pub status: TaskStatus,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListTasksQuery {
    pub project_id: i64,
    pub status: Option<TaskStatus>,
    pub assignee_id: Option<i64>,

    #[serde(default)]
    pub sort: TaskSort,

    #[serde(default)]
    pub order: SortOrder,
}

pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidJson(req): ValidJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let task = tasks::create_task(
        state.store(),
        auth.user_id,
        req.project_id,
        req.title,
        req.description,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidQuery(query): ValidQuery<ListTasksQuery>,
) -> ApiResult<Json<Vec<Task>>> {
    let filter = TaskFilter {
        project_id: query.project_id,
        status: query.status,
        assignee_id: query.assignee_id,
        sort: query.sort,
        order: query.order,
    };

    Ok(Json(tasks::list_tasks(state.store(), auth.user_id, filter).await?))
}

pub async fn get_task(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidPath(id): ValidPath<i64>,
) -> ApiResult<Json<Task>> {
    Ok(Json(tasks::get_task(state.store(), auth.user_id, id).await?))
}

pub async fn update_task(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidPath(id): ValidPath<i64>,
    ValidJson(req): ValidJson<UpdateTaskRequest>,
) -> ApiResult<Json<Task>> {
    let task = tasks::update_task(
        state.store(),
        auth.user_id,
        id,
        UpdateTask {
            title: req.title,
            description: req.description,
            assignee_id: req.assignee_id,
        },
    )
    .await?;

    Ok(Json(task))
}

pub async fn change_status(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidPath(id): ValidPath<i64>,
    ValidJson(req): ValidJson<ChangeStatusRequest>,
) -> ApiResult<Json<Task>> {
    Ok(Json(
        tasks::change_task_status(state.store(), auth.user_id, id, req.status).await?,
    ))
}

pub async fn delete_task(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidPath(id): ValidPath<i64>,
) -> ApiResult<Json<MessageResponse>> {
    tasks::delete_task(state.store(), auth.user_id, id).await?;
    Ok(Json(MessageResponse::new("Task deleted")))
}
