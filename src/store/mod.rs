//! Persistence for every collection the API touches.
//!
//! Handlers only see `dyn Store`; `MongoStore` backs production and
//! `MemoryStore` backs demos and the test suite. Every method is atomic on the
//! one document it touches: id arrays only change through push/pull and edits
//! only `$set` the fields they carry, so concurrent requests never write back a
//! stale copy. Multi-document operations are sequences of independent calls on
//! this trait; nothing across documents is transactional.

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{
    ChatMessage, Comment, MemberRole, Project, ProjectChanges, ProjectMember, Task, TaskChanges, User,
};

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("document encoding error: {0}")]
    Encode(#[from] mongodb::bson::ser::Error),
    /// A unique key was already taken.
    #[error("{0}")]
    Duplicate(String),
}

/// Which projects a listing should return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectFilter {
    All,
    /// Created by `creator_id`, or listing any of `member_ids`.
    Matching {
        creator_id: Option<String>,
        member_ids: Vec<String>,
    },
}

impl ProjectFilter {
    pub fn matches(&self, project: &Project) -> bool {
        match self {
            ProjectFilter::All => true,
            ProjectFilter::Matching { creator_id, member_ids } => {
                creator_id.as_deref() == Some(project.creator_id.as_str())
                    || project.members.iter().any(|m| member_ids.contains(m))
            }
        }
    }

    /// A `Matching` filter with no conditions can never match anything.
    pub fn is_unsatisfiable(&self) -> bool {
        matches!(self, ProjectFilter::Matching { creator_id: None, member_ids } if member_ids.is_empty())
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;

    // users
    async fn insert_user(&self, user: &User) -> StoreResult<()>;
    async fn find_user(&self, id: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_google_id(&self, google_id: &str) -> StoreResult<Option<User>>;
    /// Returns false when no user has that id.
    async fn set_user_avatar(&self, id: &str, avatar_url: &str) -> StoreResult<bool>;
    async fn link_google_account(&self, id: &str, google_id: &str) -> StoreResult<bool>;

    // projects
    async fn insert_project(&self, project: &Project) -> StoreResult<()>;
    async fn find_project(&self, id: &str) -> StoreResult<Option<Project>>;
    async fn list_projects(&self, filter: &ProjectFilter) -> StoreResult<Vec<Project>>;
    /// Sets the given fields plus `updatedAt`; returns the updated document.
    async fn update_project(&self, id: &str, changes: &ProjectChanges, at: DateTime<Utc>) -> StoreResult<Option<Project>>;
    async fn delete_project(&self, id: &str) -> StoreResult<bool>;
    /// Appends `task_id` to the project's task list and bumps `updatedAt`.
    async fn push_project_task(&self, project_id: &str, task_id: &str, at: DateTime<Utc>) -> StoreResult<bool>;
    /// Removes `task_id` from the project's task list and bumps `updatedAt`.
    async fn pull_project_task(&self, project_id: &str, task_id: &str, at: DateTime<Utc>) -> StoreResult<()>;
    async fn push_project_members(&self, project_id: &str, member_ids: &[String]) -> StoreResult<bool>;
    /// Returns false when the project does not exist.
    async fn pull_project_member(&self, project_id: &str, member_id: &str) -> StoreResult<bool>;
    async fn touch_project(&self, id: &str, at: DateTime<Utc>) -> StoreResult<()>;

    // project members
    async fn insert_members(&self, members: &[ProjectMember]) -> StoreResult<()>;
    async fn find_member(&self, id: &str) -> StoreResult<Option<ProjectMember>>;
    async fn find_members(&self, ids: &[String]) -> StoreResult<Vec<ProjectMember>>;
    async fn find_members_by_email(&self, email: &str) -> StoreResult<Vec<ProjectMember>>;
    async fn find_project_member_by_email(&self, project_id: &str, email: &str) -> StoreResult<Option<ProjectMember>>;
    async fn set_member_role(&self, id: &str, role: MemberRole) -> StoreResult<bool>;
    async fn delete_member(&self, id: &str) -> StoreResult<bool>;
    async fn delete_members_by_project(&self, project_id: &str) -> StoreResult<u64>;

    // tasks
    async fn insert_task(&self, task: &Task) -> StoreResult<()>;
    async fn find_task(&self, id: &str) -> StoreResult<Option<Task>>;
    async fn find_tasks(&self, ids: &[String]) -> StoreResult<Vec<Task>>;
    async fn list_tasks_by_project(&self, project_id: &str) -> StoreResult<Vec<Task>>;
    /// Sets the given fields plus `updatedAt`; returns the updated document.
    async fn update_task(&self, id: &str, changes: &TaskChanges, at: DateTime<Utc>) -> StoreResult<Option<Task>>;
    async fn push_task_comment(&self, task_id: &str, comment_id: &str) -> StoreResult<bool>;
    /// Returns false when the task does not exist.
    async fn pull_task_comment(&self, task_id: &str, comment_id: &str) -> StoreResult<bool>;
    async fn touch_task(&self, id: &str, at: DateTime<Utc>) -> StoreResult<()>;
    async fn delete_task(&self, id: &str) -> StoreResult<bool>;
    async fn delete_tasks_by_project(&self, project_id: &str) -> StoreResult<u64>;

    // comments
    async fn insert_comment(&self, comment: &Comment) -> StoreResult<()>;
    async fn find_comment(&self, id: &str) -> StoreResult<Option<Comment>>;
    async fn find_comments(&self, ids: &[String]) -> StoreResult<Vec<Comment>>;
    async fn list_comments_by_task(&self, task_id: &str) -> StoreResult<Vec<Comment>>;
    async fn delete_comment(&self, id: &str) -> StoreResult<bool>;
    async fn delete_comments_by_tasks(&self, task_ids: &[String]) -> StoreResult<u64>;

    // chat
    async fn insert_chat_message(&self, message: &ChatMessage) -> StoreResult<()>;
    /// Oldest first.
    async fn list_chat_messages(&self, project_id: &str) -> StoreResult<Vec<ChatMessage>>;
}
