use actix_web::{web, HttpResponse};
use log::info;

use crate::app_state::AppState;
use crate::auth::placeholder_avatar;
use crate::error::{ApiError, ApiResult};
use crate::models::payload::{InviteRequest, MessageResponse, RoleUpdate};
use crate::models::{filled, MemberRole, ProjectMember};

pub async fn invite_member(
    data: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<InviteRequest>,
) -> ApiResult<HttpResponse> {
    let email = filled(body.into_inner().email).ok_or_else(|| ApiError::validation("Email is required"))?;

    let store = data.store.as_ref();
    let project = store
        .find_project(&path.into_inner())
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    if store.find_project_member_by_email(&project.id, &email).await?.is_some() {
        return Err(ApiError::Conflict("Member already invited to this project".to_string()));
    }

    // Borrow the display name and avatar from a registered account when there is one.
    let (name, avatar_url) = match store.find_user_by_email(&email).await? {
        Some(user) => {
            let avatar = user.avatar_url.unwrap_or_else(|| placeholder_avatar(&email));
            (user.name, avatar)
        }
        None => (email.clone(), placeholder_avatar(&email)),
    };

    let member = ProjectMember::new(&project.id, name, email, MemberRole::Member, Some(avatar_url));
    store.insert_members(std::slice::from_ref(&member)).await?;
    store
        .push_project_members(&project.id, std::slice::from_ref(&member.id))
        .await?;

    info!("Invited {} to project {}", member.email, project.id);
    Ok(HttpResponse::Created().json(member))
}

pub async fn remove_member(
    data: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (project_id, member_id) = path.into_inner();
    let store = data.store.as_ref();

    // Any caller may do this; there is no role check on removal.
    if !store.pull_project_member(&project_id, &member_id).await? {
        return Err(ApiError::not_found("Project not found"));
    }
    store.delete_member(&member_id).await?;

    Ok(HttpResponse::Ok().json(MessageResponse::new("Member removed from project")))
}

pub async fn update_member_role(
    data: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<RoleUpdate>,
) -> ApiResult<HttpResponse> {
    let (project_id, member_id) = path.into_inner();
    let role = body.into_inner().role.ok_or_else(|| ApiError::validation("Role is required"))?;

    let store = data.store.as_ref();
    let mut member = store
        .find_member(&member_id)
        .await?
        .filter(|m| m.project_id == project_id)
        .ok_or_else(|| ApiError::not_found("Member not found"))?;

    store.set_member_role(&member.id, role).await?;
    member.role = role;
    Ok(HttpResponse::Ok().json(member))
}
