use actix_web::{web, HttpResponse};
use chrono::Utc;
use log::{debug, info};

use crate::app_state::AppState;
use crate::error::{ApiError, ApiResult};
use crate::models::payload::{CreateTaskRequest, MessageResponse, TaskCommentRequest, UpdateTaskRequest};
use crate::models::task::NewTask;
use crate::models::{filled, Comment, Task, TaskChanges};
use crate::project::populate_tasks;
use crate::store::Store;

async fn find_task(store: &dyn Store, id: &str) -> ApiResult<Task> {
    store
        .find_task(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))
}

pub async fn list_by_project(data: web::Data<AppState>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let store = data.store.as_ref();
    let tasks = store.list_tasks_by_project(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(populate_tasks(store, tasks).await?))
}

pub async fn get_task(data: web::Data<AppState>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let store = data.store.as_ref();
    let task = find_task(store, &path.into_inner()).await?;
    let mut detail = populate_tasks(store, vec![task]).await?;
    Ok(HttpResponse::Ok().json(detail.pop()))
}

pub async fn create_task(data: web::Data<AppState>, body: web::Json<CreateTaskRequest>) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let store = data.store.as_ref();

    let project = match filled(body.project_id) {
        Some(id) => store.find_project(&id).await?,
        None => None,
    };
    let project = project.ok_or_else(|| ApiError::not_found("Project not found"))?;

    let fields = match (filled(body.title), filled(body.description), body.due_date, filled(body.creator_id)) {
        (Some(title), Some(description), Some(due_date), Some(creator_id)) => NewTask {
            title,
            description,
            status: body.status.unwrap_or_default(),
            priority: body.priority.unwrap_or_default(),
            due_date,
            assignee_id: filled(body.assignee_id),
            creator_id,
            tags: body.tags.unwrap_or_default(),
        },
        _ => {
            return Err(ApiError::validation(
                "title, description, dueDate, and creatorId are required",
            ))
        }
    };

    let task = Task::new(&project.id, fields);
    store.insert_task(&task).await?;
    store.push_project_task(&project.id, &task.id, Utc::now()).await?;

    info!("Created task {} in project {}", task.id, project.id);
    Ok(HttpResponse::Created().json(task))
}

pub async fn update_task(
    data: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateTaskRequest>,
) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let changes = TaskChanges {
        title: filled(body.title),
        description: filled(body.description),
        status: body.status,
        priority: body.priority,
        due_date: body.due_date,
        // `null` or "" unassigns; leaving the field out keeps the assignee.
        assignee_id: body.assignee_id.map(filled),
        tags: body.tags,
    };

    let store = data.store.as_ref();
    let now = Utc::now();
    let task = store
        .update_task(&path.into_inner(), &changes, now)
        .await?
        .ok_or_else(|| ApiError::not_found("Task not found"))?;
    store.touch_project(&task.project_id, now).await?;
    debug!("Updated task {}", task.id);
    Ok(HttpResponse::Ok().json(task))
}

pub async fn delete_task(data: web::Data<AppState>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let store = data.store.as_ref();
    let task = find_task(store, &path.into_inner()).await?;

    store.pull_project_task(&task.project_id, &task.id, Utc::now()).await?;
    let comments = store.delete_comments_by_tasks(std::slice::from_ref(&task.id)).await?;
    store.delete_task(&task.id).await?;

    info!("Deleted task {} and {} comment(s)", task.id, comments);
    Ok(HttpResponse::Ok().json(MessageResponse::new("Task deleted successfully")))
}

pub async fn add_comment(
    data: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<TaskCommentRequest>,
) -> ApiResult<HttpResponse> {
    let store = data.store.as_ref();
    let task = find_task(store, &path.into_inner()).await?;

    let body = body.into_inner();
    let (content, user_id) = match (filled(body.content), filled(body.user_id)) {
        (Some(content), Some(user_id)) => (content, user_id),
        _ => return Err(ApiError::validation("Content and userId are required")),
    };

    let comment = Comment::new(&task.id, content, user_id);
    store.insert_comment(&comment).await?;

    let now = Utc::now();
    store.push_task_comment(&task.id, &comment.id).await?;
    store.touch_task(&task.id, now).await?;
    store.touch_project(&task.project_id, now).await?;

    Ok(HttpResponse::Created().json(comment))
}
