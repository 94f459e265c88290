use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use log::{debug, info};
use mongodb::{
    bson::{doc, to_bson, Document},
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{ClientOptions, IndexOptions, ReturnDocument},
    Client, Collection, Database, IndexModel,
};
use serde::de::DeserializeOwned;

use super::{ProjectFilter, Store, StoreError, StoreResult};
use crate::models::{
    ChatMessage, Comment, MemberRole, Project, ProjectChanges, ProjectMember, Task, TaskChanges, User,
};

const DUPLICATE_KEY: i32 = 11000;

pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    /// Connects and makes sure the unique email index exists.
    pub async fn connect(uri: &str, db_name: &str) -> StoreResult<Self> {
        let client_options = ClientOptions::parse(uri).await?;
        let client = Client::with_options(client_options)?;
        let db = client.database(db_name);
        let store = MongoStore { db };

        let unique_email = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        store.users().create_index(unique_email).await?;
        info!("Connected to MongoDB database {}", db_name);
        Ok(store)
    }

    fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    fn projects(&self) -> Collection<Project> {
        self.db.collection("projects")
    }

    fn members(&self) -> Collection<ProjectMember> {
        self.db.collection("projectmembers")
    }

    fn tasks(&self) -> Collection<Task> {
        self.db.collection("tasks")
    }

    fn comments(&self) -> Collection<Comment> {
        self.db.collection("comments")
    }

    fn chat(&self) -> Collection<ChatMessage> {
        self.db.collection("chatmessages")
    }
}

async fn find_all<T>(coll: &Collection<T>, filter: Document) -> StoreResult<Vec<T>>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    let cursor = coll.find(filter).await?;
    Ok(cursor.try_collect().await?)
}

fn by_ids(ids: &[String]) -> Document {
    doc! { "_id": { "$in": ids.to_vec() } }
}

fn project_update(changes: &ProjectChanges, at: DateTime<Utc>) -> StoreResult<Document> {
    let mut set = doc! { "updatedAt": to_bson(&at)? };
    if let Some(name) = &changes.name {
        set.insert("name", name.as_str());
    }
    if let Some(description) = &changes.description {
        set.insert("description", description.as_str());
    }
    Ok(doc! { "$set": set })
}

fn task_update(changes: &TaskChanges, at: DateTime<Utc>) -> StoreResult<Document> {
    let mut set = doc! { "updatedAt": to_bson(&at)? };
    if let Some(title) = &changes.title {
        set.insert("title", title.as_str());
    }
    if let Some(description) = &changes.description {
        set.insert("description", description.as_str());
    }
    if let Some(status) = &changes.status {
        set.insert("status", to_bson(status)?);
    }
    if let Some(priority) = &changes.priority {
        set.insert("priority", to_bson(priority)?);
    }
    if let Some(due_date) = &changes.due_date {
        set.insert("dueDate", to_bson(due_date)?);
    }
    if let Some(assignee_id) = &changes.assignee_id {
        set.insert("assigneeId", to_bson(assignee_id)?);
    }
    if let Some(tags) = &changes.tags {
        set.insert("tags", to_bson(tags)?);
    }
    Ok(doc! { "$set": set })
}

fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}

#[async_trait]
impl Store for MongoStore {
    async fn ping(&self) -> StoreResult<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    async fn insert_user(&self, user: &User) -> StoreResult<()> {
        match self.users().insert_one(user).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(StoreError::Duplicate(
                "User with this email already exists".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_user(&self, id: &str) -> StoreResult<Option<User>> {
        Ok(self.users().find_one(doc! { "_id": id }).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.users().find_one(doc! { "email": email }).await?)
    }

    async fn find_user_by_google_id(&self, google_id: &str) -> StoreResult<Option<User>> {
        Ok(self.users().find_one(doc! { "googleId": google_id }).await?)
    }

    async fn set_user_avatar(&self, id: &str, avatar_url: &str) -> StoreResult<bool> {
        let res = self
            .users()
            .update_one(doc! { "_id": id }, doc! { "$set": { "avatarUrl": avatar_url } })
            .await?;
        Ok(res.matched_count == 1)
    }

    async fn link_google_account(&self, id: &str, google_id: &str) -> StoreResult<bool> {
        let res = self
            .users()
            .update_one(doc! { "_id": id }, doc! { "$set": { "googleId": google_id } })
            .await?;
        Ok(res.matched_count == 1)
    }

    async fn insert_project(&self, project: &Project) -> StoreResult<()> {
        self.projects().insert_one(project).await?;
        Ok(())
    }

    async fn find_project(&self, id: &str) -> StoreResult<Option<Project>> {
        Ok(self.projects().find_one(doc! { "_id": id }).await?)
    }

    async fn list_projects(&self, filter: &ProjectFilter) -> StoreResult<Vec<Project>> {
        let query = match filter {
            ProjectFilter::All => doc! {},
            ProjectFilter::Matching { creator_id, member_ids } => {
                let mut clauses = Vec::new();
                if let Some(creator_id) = creator_id {
                    clauses.push(doc! { "creatorId": creator_id });
                }
                if !member_ids.is_empty() {
                    clauses.push(doc! { "members": { "$in": member_ids.clone() } });
                }
                if clauses.is_empty() {
                    return Ok(Vec::new());
                }
                doc! { "$or": clauses }
            }
        };
        debug!("Listing projects with filter {:?}", query);
        find_all(&self.projects(), query).await
    }

    async fn update_project(&self, id: &str, changes: &ProjectChanges, at: DateTime<Utc>) -> StoreResult<Option<Project>> {
        Ok(self
            .projects()
            .find_one_and_update(doc! { "_id": id }, project_update(changes, at)?)
            .return_document(ReturnDocument::After)
            .await?)
    }

    async fn delete_project(&self, id: &str) -> StoreResult<bool> {
        let res = self.projects().delete_one(doc! { "_id": id }).await?;
        Ok(res.deleted_count == 1)
    }

    async fn push_project_task(&self, project_id: &str, task_id: &str, at: DateTime<Utc>) -> StoreResult<bool> {
        let res = self
            .projects()
            .update_one(
                doc! { "_id": project_id },
                doc! {
                    "$push": { "tasks": task_id },
                    "$set": { "updatedAt": to_bson(&at)? },
                },
            )
            .await?;
        Ok(res.matched_count == 1)
    }

    async fn pull_project_task(&self, project_id: &str, task_id: &str, at: DateTime<Utc>) -> StoreResult<()> {
        self.projects()
            .update_one(
                doc! { "_id": project_id },
                doc! {
                    "$pull": { "tasks": task_id },
                    "$set": { "updatedAt": to_bson(&at)? },
                },
            )
            .await?;
        Ok(())
    }

    async fn push_project_members(&self, project_id: &str, member_ids: &[String]) -> StoreResult<bool> {
        let res = self
            .projects()
            .update_one(
                doc! { "_id": project_id },
                doc! { "$push": { "members": { "$each": member_ids.to_vec() } } },
            )
            .await?;
        Ok(res.matched_count == 1)
    }

    async fn pull_project_member(&self, project_id: &str, member_id: &str) -> StoreResult<bool> {
        let res = self
            .projects()
            .update_one(doc! { "_id": project_id }, doc! { "$pull": { "members": member_id } })
            .await?;
        Ok(res.matched_count == 1)
    }

    async fn touch_project(&self, id: &str, at: DateTime<Utc>) -> StoreResult<()> {
        self.projects()
            .update_one(doc! { "_id": id }, doc! { "$set": { "updatedAt": to_bson(&at)? } })
            .await?;
        Ok(())
    }

    async fn insert_members(&self, members: &[ProjectMember]) -> StoreResult<()> {
        if members.is_empty() {
            return Ok(());
        }
        self.members().insert_many(members).await?;
        Ok(())
    }

    async fn find_member(&self, id: &str) -> StoreResult<Option<ProjectMember>> {
        Ok(self.members().find_one(doc! { "_id": id }).await?)
    }

    async fn find_members(&self, ids: &[String]) -> StoreResult<Vec<ProjectMember>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        find_all(&self.members(), by_ids(ids)).await
    }

    async fn find_members_by_email(&self, email: &str) -> StoreResult<Vec<ProjectMember>> {
        find_all(&self.members(), doc! { "email": email }).await
    }

    async fn find_project_member_by_email(&self, project_id: &str, email: &str) -> StoreResult<Option<ProjectMember>> {
        Ok(self
            .members()
            .find_one(doc! { "projectId": project_id, "email": email })
            .await?)
    }

    async fn set_member_role(&self, id: &str, role: MemberRole) -> StoreResult<bool> {
        let res = self
            .members()
            .update_one(doc! { "_id": id }, doc! { "$set": { "role": to_bson(&role)? } })
            .await?;
        Ok(res.matched_count == 1)
    }

    async fn delete_member(&self, id: &str) -> StoreResult<bool> {
        let res = self.members().delete_one(doc! { "_id": id }).await?;
        Ok(res.deleted_count == 1)
    }

    async fn delete_members_by_project(&self, project_id: &str) -> StoreResult<u64> {
        let res = self.members().delete_many(doc! { "projectId": project_id }).await?;
        Ok(res.deleted_count)
    }

    async fn insert_task(&self, task: &Task) -> StoreResult<()> {
        self.tasks().insert_one(task).await?;
        Ok(())
    }

    async fn find_task(&self, id: &str) -> StoreResult<Option<Task>> {
        Ok(self.tasks().find_one(doc! { "_id": id }).await?)
    }

    async fn find_tasks(&self, ids: &[String]) -> StoreResult<Vec<Task>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        find_all(&self.tasks(), by_ids(ids)).await
    }

    async fn list_tasks_by_project(&self, project_id: &str) -> StoreResult<Vec<Task>> {
        find_all(&self.tasks(), doc! { "projectId": project_id }).await
    }

    async fn update_task(&self, id: &str, changes: &TaskChanges, at: DateTime<Utc>) -> StoreResult<Option<Task>> {
        Ok(self
            .tasks()
            .find_one_and_update(doc! { "_id": id }, task_update(changes, at)?)
            .return_document(ReturnDocument::After)
            .await?)
    }

    async fn push_task_comment(&self, task_id: &str, comment_id: &str) -> StoreResult<bool> {
        let res = self
            .tasks()
            .update_one(doc! { "_id": task_id }, doc! { "$push": { "comments": comment_id } })
            .await?;
        Ok(res.matched_count == 1)
    }

    async fn pull_task_comment(&self, task_id: &str, comment_id: &str) -> StoreResult<bool> {
        let res = self
            .tasks()
            .update_one(doc! { "_id": task_id }, doc! { "$pull": { "comments": comment_id } })
            .await?;
        Ok(res.matched_count == 1)
    }

    async fn touch_task(&self, id: &str, at: DateTime<Utc>) -> StoreResult<()> {
        self.tasks()
            .update_one(doc! { "_id": id }, doc! { "$set": { "updatedAt": to_bson(&at)? } })
            .await?;
        Ok(())
    }

    async fn delete_task(&self, id: &str) -> StoreResult<bool> {
        let res = self.tasks().delete_one(doc! { "_id": id }).await?;
        Ok(res.deleted_count == 1)
    }

    async fn delete_tasks_by_project(&self, project_id: &str) -> StoreResult<u64> {
        let res = self.tasks().delete_many(doc! { "projectId": project_id }).await?;
        Ok(res.deleted_count)
    }

    async fn insert_comment(&self, comment: &Comment) -> StoreResult<()> {
        self.comments().insert_one(comment).await?;
        Ok(())
    }

    async fn find_comment(&self, id: &str) -> StoreResult<Option<Comment>> {
        Ok(self.comments().find_one(doc! { "_id": id }).await?)
    }

    async fn find_comments(&self, ids: &[String]) -> StoreResult<Vec<Comment>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        find_all(&self.comments(), by_ids(ids)).await
    }

    async fn list_comments_by_task(&self, task_id: &str) -> StoreResult<Vec<Comment>> {
        find_all(&self.comments(), doc! { "taskId": task_id }).await
    }

    async fn delete_comment(&self, id: &str) -> StoreResult<bool> {
        let res = self.comments().delete_one(doc! { "_id": id }).await?;
        Ok(res.deleted_count == 1)
    }

    async fn delete_comments_by_tasks(&self, task_ids: &[String]) -> StoreResult<u64> {
        if task_ids.is_empty() {
            return Ok(0);
        }
        let res = self
            .comments()
            .delete_many(doc! { "taskId": { "$in": task_ids.to_vec() } })
            .await?;
        Ok(res.deleted_count)
    }

    async fn insert_chat_message(&self, message: &ChatMessage) -> StoreResult<()> {
        self.chat().insert_one(message).await?;
        Ok(())
    }

    async fn list_chat_messages(&self, project_id: &str) -> StoreResult<Vec<ChatMessage>> {
        // Timestamps are stored as RFC 3339 strings whose fractional part varies
        // in width, so order on the decoded values rather than in the query.
        let mut messages = find_all(&self.chat(), doc! { "projectId": project_id }).await?;
        messages.sort_by_key(|m| m.created_at);
        Ok(messages)
    }
}
