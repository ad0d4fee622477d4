/// Comment endpoints
///
/// - `POST /api/v1/comments` `{taskId, content}` (201)
/// - `DELETE /api/v1/comments/:id` - the author, or an OWNER/ADMIN

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ValidJson, ValidPath},
    routes::MessageResponse,
};
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use validator::Validate;
use workboard_shared::auth::middleware::AuthContext;
use workboard_shared::models::comment::Comment;
use workboard_shared::services::comments;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub task_id: i64,

    #[validate(length(min = 1, max = 500, message = "Content must be 1-500 characters"))]
    pub content: String,
}

pub async fn create_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidJson(req): ValidJson<CreateCommentRequest>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    let comment =
        comments::create_comment(state.store(), auth.user_id, req.task_id, req.content).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidPath(id): ValidPath<i64>,
) -> ApiResult<Json<MessageResponse>> {
    comments::delete_comment(state.store(), auth.user_id, id).await?;
    Ok(Json(MessageResponse::new("Comment deleted")))
}
