use actix_web::{web, HttpResponse};
use log::{debug, warn};

use crate::app_state::AppState;
use crate::error::{ApiError, ApiResult};
use crate::models::payload::{CreateCommentRequest, MessageResponse};
use crate::models::{filled, is_valid_id, Comment};

pub async fn list_by_task(data: web::Data<AppState>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let task_id = path.into_inner();
    if !is_valid_id(&task_id) {
        return Err(ApiError::validation("Invalid task ID"));
    }
    let comments = data.store.list_comments_by_task(&task_id).await?;
    Ok(HttpResponse::Ok().json(comments))
}

pub async fn create_comment(
    data: web::Data<AppState>,
    body: web::Json<CreateCommentRequest>,
) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let (content, user_id, task_id) = match (filled(body.content), filled(body.user_id), filled(body.task_id)) {
        (Some(content), Some(user_id), Some(task_id)) => (content, user_id, task_id),
        _ => return Err(ApiError::validation("Content, userId, and taskId are required")),
    };
    if !is_valid_id(&task_id) {
        return Err(ApiError::validation("Invalid task ID"));
    }

    let store = data.store.as_ref();
    let task = store
        .find_task(&task_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;

    let comment = Comment::new(&task.id, content, user_id);
    store.insert_comment(&comment).await?;
    store.push_task_comment(&task.id, &comment.id).await?;

    debug!("Comment {} added to task {}", comment.id, task.id);
    Ok(HttpResponse::Created().json(comment))
}

pub async fn delete_comment(data: web::Data<AppState>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    if !is_valid_id(&id) {
        return Err(ApiError::validation("Invalid comment ID"));
    }

    let store = data.store.as_ref();
    let comment = store
        .find_comment(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Comment not found"))?;
    store.delete_comment(&comment.id).await?;

    if !store.pull_task_comment(&comment.task_id, &comment.id).await? {
        warn!("Comment {} belonged to missing task {}", comment.id, comment.task_id);
    }

    Ok(HttpResponse::Ok().json(MessageResponse::new("Comment deleted successfully")))
}
