//! Typed HTTP client for the API, one method per endpoint.

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::error::ErrorBody;
use crate::models::payload::{
    AvatarUpdate, AvatarUpdated, ChatPost, CreateCommentRequest, CreateProjectRequest, CreateTaskRequest,
    HealthStatus, InviteRequest, LoginInfo, MessageResponse, ProjectListQuery, RequesterQuery, RoleUpdate,
    SignupInfo, TaskCommentRequest, UpdateProjectRequest, UpdateTaskRequest,
};
use crate::models::{
    ChatMessage, Comment, MemberRole, Project, ProjectDetail, ProjectMember, PublicUser, Task, TaskDetail,
};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("request failed ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("no user is signed in")]
    NotSignedIn,
}

impl ClientError {
    /// HTTP status of an API error, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// `base_url` points at the API root, e.g. `http://localhost:5000/api`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        ApiClient { http, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|body| body.message)
                .unwrap_or_else(|_| if text.is_empty() { status.to_string() } else { text });
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json::<T>().await?)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(self.http.get(self.url(path))).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ClientResult<T> {
        self.send(self.http.post(self.url(path)).json(body)).await
    }

    async fn put<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> ClientResult<T> {
        self.send(self.http.put(self.url(path)).json(body)).await
    }

    async fn delete<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.send(self.http.delete(self.url(path))).await
    }

    // auth

    pub async fn signup(&self, name: &str, email: &str, password: &str) -> ClientResult<PublicUser> {
        let body = SignupInfo {
            name: Some(name.to_string()),
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        };
        self.post("/auth/signup", &body).await
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<PublicUser> {
        let body = LoginInfo {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        };
        self.post("/auth/login", &body).await
    }

    pub async fn update_avatar(&self, user_id: &str, avatar_url: &str) -> ClientResult<AvatarUpdated> {
        let body = AvatarUpdate {
            user_id: Some(user_id.to_string()),
            avatar_url: Some(avatar_url.to_string()),
        };
        self.put("/auth/me/avatar", &body).await
    }

    pub async fn current_user(&self) -> ClientResult<Option<PublicUser>> {
        self.get("/auth/current-user").await
    }

    pub async fn logout(&self) -> ClientResult<MessageResponse> {
        self.get("/auth/logout").await
    }

    // projects

    pub async fn list_projects(&self, user_id: Option<&str>, email: Option<&str>) -> ClientResult<Vec<ProjectDetail>> {
        let query = ProjectListQuery {
            user_id: user_id.map(str::to_string),
            email: email.map(str::to_string),
        };
        self.send(self.http.get(self.url("/projects")).query(&query)).await
    }

    pub async fn get_project(&self, id: &str) -> ClientResult<ProjectDetail> {
        self.get(&format!("/projects/{}", id)).await
    }

    pub async fn create_project(&self, project: &CreateProjectRequest) -> ClientResult<Project> {
        self.post("/projects", project).await
    }

    pub async fn update_project(&self, id: &str, changes: &UpdateProjectRequest) -> ClientResult<Project> {
        self.put(&format!("/projects/{}", id), changes).await
    }

    pub async fn delete_project(&self, id: &str, user_id: &str) -> ClientResult<MessageResponse> {
        let query = RequesterQuery {
            user_id: Some(user_id.to_string()),
        };
        self.send(self.http.delete(self.url(&format!("/projects/{}", id))).query(&query))
            .await
    }

    pub async fn invite_member(&self, project_id: &str, email: &str) -> ClientResult<ProjectMember> {
        let body = InviteRequest {
            email: Some(email.to_string()),
        };
        self.post(&format!("/projects/{}/invite", project_id), &body).await
    }

    pub async fn remove_member(&self, project_id: &str, member_id: &str) -> ClientResult<MessageResponse> {
        self.delete(&format!("/projects/{}/members/{}", project_id, member_id)).await
    }

    pub async fn update_member_role(
        &self,
        project_id: &str,
        member_id: &str,
        role: MemberRole,
    ) -> ClientResult<ProjectMember> {
        let body = RoleUpdate { role: Some(role) };
        self.put(&format!("/projects/{}/members/{}", project_id, member_id), &body)
            .await
    }

    pub async fn list_chat(&self, project_id: &str) -> ClientResult<Vec<ChatMessage>> {
        self.get(&format!("/projects/{}/chat", project_id)).await
    }

    pub async fn post_chat(&self, project_id: &str, message: &ChatPost) -> ClientResult<ChatMessage> {
        self.post(&format!("/projects/{}/chat", project_id), message).await
    }

    // tasks

    pub async fn list_tasks(&self, project_id: &str) -> ClientResult<Vec<TaskDetail>> {
        self.get(&format!("/tasks/project/{}", project_id)).await
    }

    pub async fn get_task(&self, id: &str) -> ClientResult<TaskDetail> {
        self.get(&format!("/tasks/{}", id)).await
    }

    pub async fn create_task(&self, task: &CreateTaskRequest) -> ClientResult<Task> {
        self.post("/tasks", task).await
    }

    pub async fn update_task(&self, id: &str, changes: &UpdateTaskRequest) -> ClientResult<Task> {
        self.put(&format!("/tasks/{}", id), changes).await
    }

    pub async fn delete_task(&self, id: &str) -> ClientResult<MessageResponse> {
        self.delete(&format!("/tasks/{}", id)).await
    }

    pub async fn add_task_comment(&self, task_id: &str, content: &str, user_id: &str) -> ClientResult<Comment> {
        let body = TaskCommentRequest {
            content: Some(content.to_string()),
            user_id: Some(user_id.to_string()),
        };
        self.post(&format!("/tasks/{}/comments", task_id), &body).await
    }

    // comments

    pub async fn list_comments(&self, task_id: &str) -> ClientResult<Vec<Comment>> {
        self.get(&format!("/comments/task/{}", task_id)).await
    }

    pub async fn create_comment(&self, comment: &CreateCommentRequest) -> ClientResult<Comment> {
        self.post("/comments", comment).await
    }

    pub async fn delete_comment(&self, id: &str) -> ClientResult<MessageResponse> {
        self.delete(&format!("/comments/{}", id)).await
    }

    /// `/health` lives outside the API prefix.
    pub async fn health(&self) -> ClientResult<HealthStatus> {
        let root = self.base_url.trim_end_matches("/api");
        self.send(self.http.get(format!("{}/health", root))).await
    }
}
