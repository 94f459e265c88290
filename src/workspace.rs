//! Client-side session state: who is signed in, their projects, and the
//! tasks of the project being looked at.
//!
//! Every mutation goes to the server first and is followed by a full reload
//! of projects and tasks; nothing is patched locally.

use crate::client::{ApiClient, ClientError, ClientResult};
use crate::models::payload::{
    ChatPost, CreateProjectRequest, CreateTaskRequest, NewMemberRequest, UpdateProjectRequest, UpdateTaskRequest,
};
use crate::models::{
    ChatMessage, Comment, MemberRole, Project, ProjectDetail, ProjectMember, PublicUser, Task, TaskDetail, TaskStatus,
};

pub struct Workspace {
    client: ApiClient,
    user: Option<PublicUser>,
    projects: Vec<ProjectDetail>,
    current: Option<String>,
    tasks: Vec<TaskDetail>,
}

impl Workspace {
    pub fn new(client: ApiClient) -> Self {
        Workspace {
            client,
            user: None,
            projects: Vec::new(),
            current: None,
            tasks: Vec::new(),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn user(&self) -> Option<&PublicUser> {
        self.user.as_ref()
    }

    pub fn projects(&self) -> &[ProjectDetail] {
        &self.projects
    }

    pub fn current_project(&self) -> Option<&ProjectDetail> {
        let id = self.current.as_deref()?;
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn tasks(&self) -> &[TaskDetail] {
        &self.tasks
    }

    fn signed_in(&self) -> ClientResult<&PublicUser> {
        self.user.as_ref().ok_or(ClientError::NotSignedIn)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> ClientResult<()> {
        self.user = Some(self.client.login(email, password).await?);
        self.load_projects().await
    }

    pub async fn signup(&mut self, name: &str, email: &str, password: &str) -> ClientResult<()> {
        self.user = Some(self.client.signup(name, email, password).await?);
        self.load_projects().await
    }

    /// Forgets everything local even if the server call fails.
    pub async fn logout(&mut self) -> ClientResult<()> {
        let result = self.client.logout().await.map(|_| ());
        self.user = None;
        self.projects.clear();
        self.current = None;
        self.tasks.clear();
        result
    }

    /// Reloads the project list, then the tasks of whichever project ends up
    /// selected. A selection that no longer exists falls back to the first project.
    pub async fn load_projects(&mut self) -> ClientResult<()> {
        let user = self.signed_in()?;
        let projects = self
            .client
            .list_projects(Some(&user.id), Some(&user.email))
            .await?;

        let still_there = self
            .current
            .as_deref()
            .is_some_and(|id| projects.iter().any(|p| p.id == id));
        if !still_there {
            self.current = projects.first().map(|p| p.id.clone());
        }
        self.projects = projects;
        self.load_tasks().await
    }

    pub async fn select_project(&mut self, project_id: &str) -> ClientResult<()> {
        if !self.projects.iter().any(|p| p.id == project_id) {
            return Err(ClientError::Api {
                status: 404,
                message: "Project not found".to_string(),
            });
        }
        self.current = Some(project_id.to_string());
        self.load_tasks().await
    }

    pub async fn load_tasks(&mut self) -> ClientResult<()> {
        self.tasks = match self.current.as_deref() {
            Some(id) => self.client.list_tasks(id).await?,
            None => Vec::new(),
        };
        Ok(())
    }

    /// Creates a project owned by the signed-in user and selects it.
    pub async fn create_project(
        &mut self,
        name: &str,
        description: &str,
        color: &str,
        members: Vec<NewMemberRequest>,
    ) -> ClientResult<Project> {
        let creator_id = self.signed_in()?.id.clone();
        let request = CreateProjectRequest {
            name: Some(name.to_string()),
            description: Some(description.to_string()),
            color: Some(color.to_string()),
            members,
            creator_id: Some(creator_id),
        };
        let project = self.client.create_project(&request).await?;
        self.current = Some(project.id.clone());
        self.load_projects().await?;
        Ok(project)
    }

    pub async fn update_project(&mut self, id: &str, changes: UpdateProjectRequest) -> ClientResult<Project> {
        let project = self.client.update_project(id, &changes).await?;
        self.load_projects().await?;
        Ok(project)
    }

    pub async fn delete_project(&mut self, id: &str) -> ClientResult<()> {
        let user_id = self.signed_in()?.id.clone();
        self.client.delete_project(id, &user_id).await?;
        if self.current.as_deref() == Some(id) {
            self.current = None;
        }
        self.load_projects().await
    }

    /// Missing `creatorId` and `projectId` are filled from the signed-in user
    /// and the selected project.
    pub async fn create_task(&mut self, mut task: CreateTaskRequest) -> ClientResult<Task> {
        if task.creator_id.is_none() {
            task.creator_id = Some(self.signed_in()?.id.clone());
        }
        if task.project_id.is_none() {
            task.project_id = self.current.clone();
        }
        let created = self.client.create_task(&task).await?;
        self.load_projects().await?;
        Ok(created)
    }

    pub async fn update_task(&mut self, id: &str, changes: UpdateTaskRequest) -> ClientResult<Task> {
        let task = self.client.update_task(id, &changes).await?;
        self.load_projects().await?;
        Ok(task)
    }

    /// Board drag and drop: any status can follow any other.
    pub async fn move_task(&mut self, id: &str, status: TaskStatus) -> ClientResult<Task> {
        let changes = UpdateTaskRequest {
            status: Some(status),
            ..Default::default()
        };
        self.update_task(id, changes).await
    }

    pub async fn delete_task(&mut self, id: &str) -> ClientResult<()> {
        self.client.delete_task(id).await?;
        self.load_projects().await
    }

    pub async fn add_comment(&mut self, task_id: &str, content: &str) -> ClientResult<Comment> {
        let user_id = self.signed_in()?.id.clone();
        let comment = self.client.add_task_comment(task_id, content, &user_id).await?;
        self.load_projects().await?;
        Ok(comment)
    }

    pub async fn invite_member(&mut self, project_id: &str, email: &str) -> ClientResult<ProjectMember> {
        let member = self.client.invite_member(project_id, email).await?;
        self.load_projects().await?;
        Ok(member)
    }

    pub async fn remove_member(&mut self, project_id: &str, member_id: &str) -> ClientResult<()> {
        self.client.remove_member(project_id, member_id).await?;
        self.load_projects().await
    }

    pub async fn update_member_role(
        &mut self,
        project_id: &str,
        member_id: &str,
        role: MemberRole,
    ) -> ClientResult<ProjectMember> {
        let member = self.client.update_member_role(project_id, member_id, role).await?;
        self.load_projects().await?;
        Ok(member)
    }

    pub async fn load_chat(&self, project_id: &str) -> ClientResult<Vec<ChatMessage>> {
        self.client.list_chat(project_id).await
    }

    pub async fn send_chat(&self, project_id: &str, content: &str) -> ClientResult<ChatMessage> {
        let user = self.signed_in()?;
        let post = ChatPost {
            user_id: Some(user.id.clone()),
            user_name: Some(user.name.clone()),
            content: Some(content.to_string()),
        };
        self.client.post_chat(project_id, &post).await
    }

    pub async fn update_avatar(&mut self, avatar_url: &str) -> ClientResult<()> {
        let user_id = self.signed_in()?.id.clone();
        let updated = self.client.update_avatar(&user_id, avatar_url).await?;
        if let Some(user) = self.user.as_mut() {
            user.avatar_url = Some(updated.avatar_url);
        }
        Ok(())
    }
}
