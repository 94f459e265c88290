use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{ProjectFilter, Store, StoreError, StoreResult};
use crate::models::{
    ChatMessage, Comment, MemberRole, Project, ProjectChanges, ProjectMember, Task, TaskChanges, User,
};

#[derive(Default)]
struct Collections {
    users: Vec<User>,
    projects: Vec<Project>,
    members: Vec<ProjectMember>,
    tasks: Vec<Task>,
    comments: Vec<Comment>,
    chat: Vec<ChatMessage>,
}

/// In-process store. Keeps insertion order like a Mongo collection scan
/// does, and enforces the same unique email rule. Each call holds the write
/// lock for its whole read-modify-write.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn remove_where<T>(docs: &mut Vec<T>, pred: impl Fn(&T) -> bool) -> u64 {
    let before = docs.len();
    docs.retain(|d| !pred(d));
    (before - docs.len()) as u64
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        let mut db = self.inner.write().await;
        if db.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate(
                "User with this email already exists".to_string(),
            ));
        }
        db.users.push(user.clone());
        Ok(())
    }

    async fn find_user(&self, id: &str) -> StoreResult<Option<User>> {
        let db = self.inner.read().await;
        Ok(db.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let db = self.inner.read().await;
        Ok(db.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_google_id(&self, google_id: &str) -> StoreResult<Option<User>> {
        let db = self.inner.read().await;
        Ok(db
            .users
            .iter()
            .find(|u| u.google_id.as_deref() == Some(google_id))
            .cloned())
    }

    async fn set_user_avatar(&self, id: &str, avatar_url: &str) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        match db.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.avatar_url = Some(avatar_url.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn link_google_account(&self, id: &str, google_id: &str) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        match db.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.google_id = Some(google_id.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_project(&self, project: &Project) -> StoreResult<()> {
        self.inner.write().await.projects.push(project.clone());
        Ok(())
    }

    async fn find_project(&self, id: &str) -> StoreResult<Option<Project>> {
        let db = self.inner.read().await;
        Ok(db.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn list_projects(&self, filter: &ProjectFilter) -> StoreResult<Vec<Project>> {
        let db = self.inner.read().await;
        Ok(db
            .projects
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    async fn update_project(&self, id: &str, changes: &ProjectChanges, at: DateTime<Utc>) -> StoreResult<Option<Project>> {
        let mut db = self.inner.write().await;
        Ok(db.projects.iter_mut().find(|p| p.id == id).map(|project| {
            changes.apply(project);
            project.updated_at = at;
            project.clone()
        }))
    }

    async fn delete_project(&self, id: &str) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        Ok(remove_where(&mut db.projects, |p| p.id == id) > 0)
    }

    async fn push_project_task(&self, project_id: &str, task_id: &str, at: DateTime<Utc>) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        match db.projects.iter_mut().find(|p| p.id == project_id) {
            Some(project) => {
                project.tasks.push(task_id.to_string());
                project.updated_at = at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn pull_project_task(&self, project_id: &str, task_id: &str, at: DateTime<Utc>) -> StoreResult<()> {
        let mut db = self.inner.write().await;
        if let Some(project) = db.projects.iter_mut().find(|p| p.id == project_id) {
            project.tasks.retain(|t| t != task_id);
            project.updated_at = at;
        }
        Ok(())
    }

    async fn push_project_members(&self, project_id: &str, member_ids: &[String]) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        match db.projects.iter_mut().find(|p| p.id == project_id) {
            Some(project) => {
                project.members.extend_from_slice(member_ids);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn pull_project_member(&self, project_id: &str, member_id: &str) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        match db.projects.iter_mut().find(|p| p.id == project_id) {
            Some(project) => {
                project.members.retain(|m| m != member_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn touch_project(&self, id: &str, at: DateTime<Utc>) -> StoreResult<()> {
        let mut db = self.inner.write().await;
        if let Some(project) = db.projects.iter_mut().find(|p| p.id == id) {
            project.updated_at = at;
        }
        Ok(())
    }

    async fn insert_members(&self, members: &[ProjectMember]) -> StoreResult<()> {
        self.inner.write().await.members.extend_from_slice(members);
        Ok(())
    }

    async fn find_member(&self, id: &str) -> StoreResult<Option<ProjectMember>> {
        let db = self.inner.read().await;
        Ok(db.members.iter().find(|m| m.id == id).cloned())
    }

    async fn find_members(&self, ids: &[String]) -> StoreResult<Vec<ProjectMember>> {
        let db = self.inner.read().await;
        Ok(db
            .members
            .iter()
            .filter(|m| ids.contains(&m.id))
            .cloned()
            .collect())
    }

    async fn find_members_by_email(&self, email: &str) -> StoreResult<Vec<ProjectMember>> {
        let db = self.inner.read().await;
        Ok(db
            .members
            .iter()
            .filter(|m| m.email == email)
            .cloned()
            .collect())
    }

    async fn find_project_member_by_email(&self, project_id: &str, email: &str) -> StoreResult<Option<ProjectMember>> {
        let db = self.inner.read().await;
        Ok(db
            .members
            .iter()
            .find(|m| m.project_id == project_id && m.email == email)
            .cloned())
    }

    async fn set_member_role(&self, id: &str, role: MemberRole) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        match db.members.iter_mut().find(|m| m.id == id) {
            Some(member) => {
                member.role = role;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_member(&self, id: &str) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        Ok(remove_where(&mut db.members, |m| m.id == id) > 0)
    }

    async fn delete_members_by_project(&self, project_id: &str) -> StoreResult<u64> {
        let mut db = self.inner.write().await;
        Ok(remove_where(&mut db.members, |m| m.project_id == project_id))
    }

    async fn insert_task(&self, task: &Task) -> StoreResult<()> {
        self.inner.write().await.tasks.push(task.clone());
        Ok(())
    }

    async fn find_task(&self, id: &str) -> StoreResult<Option<Task>> {
        let db = self.inner.read().await;
        Ok(db.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn find_tasks(&self, ids: &[String]) -> StoreResult<Vec<Task>> {
        let db = self.inner.read().await;
        Ok(db
            .tasks
            .iter()
            .filter(|t| ids.contains(&t.id))
            .cloned()
            .collect())
    }

    async fn list_tasks_by_project(&self, project_id: &str) -> StoreResult<Vec<Task>> {
        let db = self.inner.read().await;
        Ok(db
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn update_task(&self, id: &str, changes: &TaskChanges, at: DateTime<Utc>) -> StoreResult<Option<Task>> {
        let mut db = self.inner.write().await;
        Ok(db.tasks.iter_mut().find(|t| t.id == id).map(|task| {
            changes.apply(task);
            task.updated_at = at;
            task.clone()
        }))
    }

    async fn push_task_comment(&self, task_id: &str, comment_id: &str) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        match db.tasks.iter_mut().find(|t| t.id == task_id) {
            Some(task) => {
                task.comments.push(comment_id.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn pull_task_comment(&self, task_id: &str, comment_id: &str) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        match db.tasks.iter_mut().find(|t| t.id == task_id) {
            Some(task) => {
                task.comments.retain(|c| c != comment_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn touch_task(&self, id: &str, at: DateTime<Utc>) -> StoreResult<()> {
        let mut db = self.inner.write().await;
        if let Some(task) = db.tasks.iter_mut().find(|t| t.id == id) {
            task.updated_at = at;
        }
        Ok(())
    }

    async fn delete_task(&self, id: &str) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        Ok(remove_where(&mut db.tasks, |t| t.id == id) > 0)
    }

    async fn delete_tasks_by_project(&self, project_id: &str) -> StoreResult<u64> {
        let mut db = self.inner.write().await;
        Ok(remove_where(&mut db.tasks, |t| t.project_id == project_id))
    }

    async fn insert_comment(&self, comment: &Comment) -> StoreResult<()> {
        self.inner.write().await.comments.push(comment.clone());
        Ok(())
    }

    async fn find_comment(&self, id: &str) -> StoreResult<Option<Comment>> {
        let db = self.inner.read().await;
        Ok(db.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn find_comments(&self, ids: &[String]) -> StoreResult<Vec<Comment>> {
        let db = self.inner.read().await;
        Ok(db
            .comments
            .iter()
            .filter(|c| ids.contains(&c.id))
            .cloned()
            .collect())
    }

    async fn list_comments_by_task(&self, task_id: &str) -> StoreResult<Vec<Comment>> {
        let db = self.inner.read().await;
        Ok(db
            .comments
            .iter()
            .filter(|c| c.task_id == task_id)
            .cloned()
            .collect())
    }

    async fn delete_comment(&self, id: &str) -> StoreResult<bool> {
        let mut db = self.inner.write().await;
        Ok(remove_where(&mut db.comments, |c| c.id == id) > 0)
    }

    async fn delete_comments_by_tasks(&self, task_ids: &[String]) -> StoreResult<u64> {
        let mut db = self.inner.write().await;
        Ok(remove_where(&mut db.comments, |c| task_ids.contains(&c.task_id)))
    }

    async fn insert_chat_message(&self, message: &ChatMessage) -> StoreResult<()> {
        self.inner.write().await.chat.push(message.clone());
        Ok(())
    }

    async fn list_chat_messages(&self, project_id: &str) -> StoreResult<Vec<ChatMessage>> {
        let db = self.inner.read().await;
        let mut messages: Vec<ChatMessage> = db
            .chat
            .iter()
            .filter(|m| m.project_id == project_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }
}
