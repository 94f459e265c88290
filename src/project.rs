use std::collections::HashMap;

use actix_web::{web, HttpResponse};
use chrono::Utc;
use log::{debug, error, info};

use crate::app_state::AppState;
use crate::auth::placeholder_avatar;
use crate::error::{ApiError, ApiResult};
use crate::models::payload::{
    CreateProjectRequest, MessageResponse, ProjectListQuery, RequesterQuery, UpdateProjectRequest,
};
use crate::models::{
    filled, order_by_ids, Comment, Project, ProjectChanges, ProjectDetail, ProjectMember, Task, TaskDetail,
};
use crate::store::{ProjectFilter, Store};

/// Inlines each task's comments, in the order the task lists them.
pub async fn populate_tasks(store: &dyn Store, tasks: Vec<Task>) -> ApiResult<Vec<TaskDetail>> {
    let comment_ids: Vec<String> = tasks.iter().flat_map(|t| t.comments.iter().cloned()).collect();
    let comments: HashMap<String, Comment> = store
        .find_comments(&comment_ids)
        .await?
        .into_iter()
        .map(|c| (c.id.clone(), c))
        .collect();

    Ok(tasks
        .into_iter()
        .map(|task| {
            let inline = task
                .comments
                .iter()
                .filter_map(|id| comments.get(id).cloned())
                .collect();
            task.into_detail(inline)
        })
        .collect())
}

/// Inlines tasks (with comments) and members. Ids that point at nothing are dropped.
pub async fn populate_project(store: &dyn Store, project: Project) -> ApiResult<ProjectDetail> {
    let tasks = order_by_ids(store.find_tasks(&project.tasks).await?, &project.tasks, |t| t.id.as_str());
    let tasks = populate_tasks(store, tasks).await?;
    let members = order_by_ids(
        store.find_members(&project.members).await?,
        &project.members,
        |m| m.id.as_str(),
    );
    Ok(project.into_detail(tasks, members))
}

async fn project_filter(store: &dyn Store, query: ProjectListQuery) -> ApiResult<ProjectFilter> {
    if query.user_id.is_none() && query.email.is_none() {
        return Ok(ProjectFilter::All);
    }
    let member_ids = match filled(query.email) {
        Some(email) => store
            .find_members_by_email(&email)
            .await?
            .into_iter()
            .map(|m| m.id)
            .collect(),
        None => Vec::new(),
    };
    Ok(ProjectFilter::Matching {
        creator_id: filled(query.user_id),
        member_ids,
    })
}

pub async fn list_projects(
    data: web::Data<AppState>,
    query: web::Query<ProjectListQuery>,
) -> ApiResult<HttpResponse> {
    let store = data.store.as_ref();
    let filter = project_filter(store, query.into_inner()).await?;
    if filter.is_unsatisfiable() {
        debug!("Project filter matches nothing");
        return Ok(HttpResponse::Ok().json(Vec::<ProjectDetail>::new()));
    }

    let mut projects = Vec::new();
    for project in store.list_projects(&filter).await? {
        projects.push(populate_project(store, project).await?);
    }
    Ok(HttpResponse::Ok().json(projects))
}

pub async fn get_project(data: web::Data<AppState>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let store = data.store.as_ref();
    let project = store
        .find_project(&path.into_inner())
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;
    Ok(HttpResponse::Ok().json(populate_project(store, project).await?))
}

pub async fn create_project(
    data: web::Data<AppState>,
    query: web::Query<RequesterQuery>,
    body: web::Json<CreateProjectRequest>,
) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let creator_id = filled(query.into_inner().user_id)
        .or(filled(body.creator_id))
        .ok_or_else(|| ApiError::validation("creatorId is required"))?;
    let (name, description, color) = match (filled(body.name), filled(body.description), filled(body.color)) {
        (Some(name), Some(description), Some(color)) => (name, description, color),
        _ => return Err(ApiError::validation("name, description, and color are required")),
    };

    let mut project = Project::new(name, description, color, creator_id);

    let mut members = Vec::with_capacity(body.members.len());
    for member in body.members {
        let (member_name, email) = match (filled(member.name), filled(member.email)) {
            (Some(n), Some(e)) => (n, e),
            _ => return Err(ApiError::validation("Each member needs a name and email")),
        };
        let avatar_url = filled(member.avatar_url).unwrap_or_else(|| placeholder_avatar(&email));
        members.push(ProjectMember::new(
            &project.id,
            member_name,
            email,
            member.role.unwrap_or_default(),
            Some(avatar_url),
        ));
    }

    let store = data.store.as_ref();
    store.insert_project(&project).await?;
    if !members.is_empty() {
        store.insert_members(&members).await?;
        project.members = members.iter().map(|m| m.id.clone()).collect();
        store.push_project_members(&project.id, &project.members).await?;
    }
    info!("Created project {} with {} member(s)", project.id, members.len());
    Ok(HttpResponse::Created().json(project))
}

pub async fn update_project(
    data: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateProjectRequest>,
) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let changes = ProjectChanges {
        name: filled(body.name),
        description: filled(body.description),
    };
    let project = data
        .store
        .update_project(&path.into_inner(), &changes, Utc::now())
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;
    Ok(HttpResponse::Ok().json(project))
}

pub async fn delete_project(
    data: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<RequesterQuery>,
) -> ApiResult<HttpResponse> {
    let store = data.store.as_ref();
    let project = store
        .find_project(&path.into_inner())
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    let requester = filled(query.into_inner().user_id);
    if requester.as_deref() != Some(project.creator_id.as_str()) {
        return Err(ApiError::Forbidden("Only the admin can delete this project.".to_string()));
    }

    // Each step stands alone; a failure part way leaves the earlier deletes in place.
    // Chat history is append-only and outlives the project.
    let task_ids: Vec<String> = store
        .list_tasks_by_project(&project.id)
        .await?
        .into_iter()
        .map(|t| t.id)
        .collect();
    let result = async {
        let comments = store.delete_comments_by_tasks(&task_ids).await?;
        let tasks = store.delete_tasks_by_project(&project.id).await?;
        let members = store.delete_members_by_project(&project.id).await?;
        store.delete_project(&project.id).await?;
        Ok::<_, ApiError>((comments, tasks, members))
    }
    .await;

    match result {
        Ok((comments, tasks, members)) => {
            info!(
                "Deleted project {} ({} tasks, {} comments, {} members)",
                project.id, tasks, comments, members
            );
            Ok(HttpResponse::Ok().json(MessageResponse::new("Project deleted successfully")))
        }
        Err(e) => {
            error!("Deleting project {} stopped part way: {}", project.id, e);
            Err(e)
        }
    }
}
