/// Tag endpoints
///
/// - `POST /api/v1/tags` `{organizationId, name}` (201)
/// - `GET /api/v1/tags?organizationId`
/// - `POST /api/v1/tags/attach` `{taskId, tagId}` (201)
/// - `POST /api/v1/tags/detach` `{taskId, tagId}`
///
/// A tag can only be attached to tasks of its own organization.

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ValidJson, ValidQuery},
    routes::MessageResponse,
};
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use validator::Validate;
use workboard_shared::auth::middleware::AuthContext;
use workboard_shared::models::tag::{Tag, TaskTag};
use workboard_shared::services::tags;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTagRequest {
    pub organization_id: i64,

    #[validate(length(min = 1, max = 50, message = "Name must be 1-50 characters"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListTagsQuery {
    pub organization_id: i64,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TagTaskRequest {
    pub task_id: i64,
    pub tag_id: i64,
}

pub async fn create_tag(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidJson(req): ValidJson<CreateTagRequest>,
) -> ApiResult<(StatusCode, Json<Tag>)> {
    let tag = tags::create_tag(state.store(), auth.user_id, req.organization_id, req.name).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn list_tags(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidQuery(query): ValidQuery<ListTagsQuery>,
) -> ApiResult<Json<Vec<Tag>>> {
    Ok(Json(
        tags::list_tags(state.store(), auth.user_id, query.organization_id).await?,
    ))
}

pub async fn attach_tag(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidJson(req): ValidJson<TagTaskRequest>,
) -> ApiResult<(StatusCode, Json<TaskTag>)> {
    let attached = tags::attach_tag(state.store(), auth.user_id, req.task_id, req.tag_id).await?;
    Ok((StatusCode::CREATED, Json(attached)))
}

pub async fn detach_tag(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidJson(req): ValidJson<TagTaskRequest>,
) -> ApiResult<Json<MessageResponse>> {
    tags::detach_tag(state.store(), auth.user_id, req.task_id, req.tag_id).await?;
    Ok(Json(MessageResponse::new("Tag detached")))
}
