use actix_web::{web, HttpResponse};
use log::debug;

use crate::app_state::AppState;
use crate::error::{ApiError, ApiResult};
use crate::models::payload::ChatPost;
use crate::models::{filled, ChatMessage};

pub async fn list_chat(data: web::Data<AppState>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let messages = data.store.list_chat_messages(&path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(messages))
}

pub async fn post_chat(
    data: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ChatPost>,
) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let (user_id, user_name, content) = match (filled(body.user_id), filled(body.user_name), filled(body.content)) {
        (Some(user_id), Some(user_name), Some(content)) => (user_id, user_name, content),
        _ => return Err(ApiError::validation("userId, userName, and content are required")),
    };

    let project_id = path.into_inner();
    if data.store.find_project(&project_id).await?.is_none() {
        return Err(ApiError::not_found("Project not found"));
    }

    let message = ChatMessage::new(&project_id, user_id, user_name, content);
    data.store.insert_chat_message(&message).await?;
    debug!("Chat message {} posted to project {}", message.id, project_id);
    Ok(HttpResponse::Created().json(message))
}
