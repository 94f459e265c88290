//! Shared setup for the API integration tests: an app over the in-memory
//! store plus a couple of request macros that hide the service types.

#![allow(dead_code, unused_macros)]

use std::sync::{Arc, Once};

use actix_web::web;
use chrono::{DateTime, Duration, Utc};
use projexia::app_state::AppState;
use projexia::config::Config;
use projexia::models::task::NewTask;
use projexia::models::{
    ChatMessage, Comment, MemberRole, Project, ProjectChanges, ProjectMember, Task, TaskChanges, User,
};
use projexia::store::{MemoryStore, ProjectFilter, Store, StoreResult};

pub const SECRET: &str = "integration-test-secret";

static INIT: Once = Once::new();

pub fn init_test_env() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

pub fn config_with(extra: &[(&str, &str)]) -> Config {
    let mut vars: Vec<(String, String)> = vec![
        ("STORAGE_BACKEND".into(), "memory".into()),
        ("BCRYPT_COST".into(), "4".into()),
        ("SESSION_SECRET".into(), SECRET.into()),
    ];
    vars.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    Config::from_lookup(|name| {
        vars.iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
    })
    .expect("test config")
}

pub fn memory_state() -> web::Data<AppState> {
    state_with(&[])
}

pub fn state_with(extra: &[(&str, &str)]) -> web::Data<AppState> {
    init_test_env();
    web::Data::new(AppState::new(Arc::new(MemoryStore::new()), config_with(extra)))
}

/// A `MemoryStore` that yields to the scheduler before every call, so
/// concurrent handlers interleave between store round trips the way they do
/// against a real database.
pub struct YieldingStore(pub MemoryStore);

macro_rules! yield_then_delegate {
    ($( fn $name:ident(&self $(, $arg:ident: $ty:ty)*) -> $ret:ty; )*) => {
        #[async_trait::async_trait]
        impl Store for YieldingStore {
            $(
                async fn $name(&self $(, $arg: $ty)*) -> $ret {
                    tokio::task::yield_now().await;
                    self.0.$name($($arg),*).await
                }
            )*
        }
    };
}

yield_then_delegate! {
    fn ping(&self) -> StoreResult<()>;
    fn insert_user(&self, user: &User) -> StoreResult<()>;
    fn find_user(&self, id: &str) -> StoreResult<Option<User>>;
    fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    fn find_user_by_google_id(&self, google_id: &str) -> StoreResult<Option<User>>;
    fn set_user_avatar(&self, id: &str, avatar_url: &str) -> StoreResult<bool>;
    fn link_google_account(&self, id: &str, google_id: &str) -> StoreResult<bool>;
    fn insert_project(&self, project: &Project) -> StoreResult<()>;
    fn find_project(&self, id: &str) -> StoreResult<Option<Project>>;
    fn list_projects(&self, filter: &ProjectFilter) -> StoreResult<Vec<Project>>;
    fn update_project(&self, id: &str, changes: &ProjectChanges, at: DateTime<Utc>) -> StoreResult<Option<Project>>;
    fn delete_project(&self, id: &str) -> StoreResult<bool>;
    fn push_project_task(&self, project_id: &str, task_id: &str, at: DateTime<Utc>) -> StoreResult<bool>;
    fn pull_project_task(&self, project_id: &str, task_id: &str, at: DateTime<Utc>) -> StoreResult<()>;
    fn push_project_members(&self, project_id: &str, member_ids: &[String]) -> StoreResult<bool>;
    fn pull_project_member(&self, project_id: &str, member_id: &str) -> StoreResult<bool>;
    fn touch_project(&self, id: &str, at: DateTime<Utc>) -> StoreResult<()>;
    fn insert_members(&self, members: &[ProjectMember]) -> StoreResult<()>;
    fn find_member(&self, id: &str) -> StoreResult<Option<ProjectMember>>;
    fn find_members(&self, ids: &[String]) -> StoreResult<Vec<ProjectMember>>;
    fn find_members_by_email(&self, email: &str) -> StoreResult<Vec<ProjectMember>>;
    fn find_project_member_by_email(&self, project_id: &str, email: &str) -> StoreResult<Option<ProjectMember>>;
    fn set_member_role(&self, id: &str, role: MemberRole) -> StoreResult<bool>;
    fn delete_member(&self, id: &str) -> StoreResult<bool>;
    fn delete_members_by_project(&self, project_id: &str) -> StoreResult<u64>;
    fn insert_task(&self, task: &Task) -> StoreResult<()>;
    fn find_task(&self, id: &str) -> StoreResult<Option<Task>>;
    fn find_tasks(&self, ids: &[String]) -> StoreResult<Vec<Task>>;
    fn list_tasks_by_project(&self, project_id: &str) -> StoreResult<Vec<Task>>;
    fn update_task(&self, id: &str, changes: &TaskChanges, at: DateTime<Utc>) -> StoreResult<Option<Task>>;
    fn push_task_comment(&self, task_id: &str, comment_id: &str) -> StoreResult<bool>;
    fn pull_task_comment(&self, task_id: &str, comment_id: &str) -> StoreResult<bool>;
    fn touch_task(&self, id: &str, at: DateTime<Utc>) -> StoreResult<()>;
    fn delete_task(&self, id: &str) -> StoreResult<bool>;
    fn delete_tasks_by_project(&self, project_id: &str) -> StoreResult<u64>;
    fn insert_comment(&self, comment: &Comment) -> StoreResult<()>;
    fn find_comment(&self, id: &str) -> StoreResult<Option<Comment>>;
    fn find_comments(&self, ids: &[String]) -> StoreResult<Vec<Comment>>;
    fn list_comments_by_task(&self, task_id: &str) -> StoreResult<Vec<Comment>>;
    fn delete_comment(&self, id: &str) -> StoreResult<bool>;
    fn delete_comments_by_tasks(&self, task_ids: &[String]) -> StoreResult<u64>;
    fn insert_chat_message(&self, message: &ChatMessage) -> StoreResult<()>;
    fn list_chat_messages(&self, project_id: &str) -> StoreResult<Vec<ChatMessage>>;
}

/// App state over a `YieldingStore`.
pub fn yielding_state() -> web::Data<AppState> {
    init_test_env();
    web::Data::new(AppState::new(
        Arc::new(YieldingStore(MemoryStore::new())),
        config_with(&[]),
    ))
}

/// Builds the full app around `state`, session middleware included.
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($state.clone())
                .wrap(projexia::session::SessionAuth::new(common::SECRET))
                .configure(projexia::routes::configure),
        )
        .await
    };
}

/// Sends a `TestRequest` and returns the status with the body parsed as JSON
/// (`Value::Null` for an empty body).
macro_rules! call {
    ($app:expr, $req:expr) => {{
        let resp = actix_web::test::call_service(&$app, $req.to_request()).await;
        let status = resp.status();
        let body = actix_web::test::read_body(resp).await;
        let json: serde_json::Value = if body.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&body).expect("JSON body")
        };
        (status, json)
    }};
}

pub async fn seed_user(state: &AppState, name: &str, email: &str) -> User {
    let user = User::with_password(
        name.into(),
        email.into(),
        "not-a-real-hash".into(),
        projexia::auth::placeholder_avatar(email),
    );
    state.store.insert_user(&user).await.expect("seed user");
    user
}

pub async fn seed_project(state: &AppState, name: &str, creator_id: &str) -> Project {
    let project = Project::new(name.into(), format!("{} description", name), "#6366f1".into(), creator_id.into());
    state.store.insert_project(&project).await.expect("seed project");
    project
}

/// Adds a member document and links it from the project.
pub async fn seed_member(state: &AppState, project: &mut Project, name: &str, email: &str) -> ProjectMember {
    let member = ProjectMember::new(&project.id, name.into(), email.into(), Default::default(), None);
    state
        .store
        .insert_members(std::slice::from_ref(&member))
        .await
        .expect("seed member");
    state
        .store
        .push_project_members(&project.id, std::slice::from_ref(&member.id))
        .await
        .expect("link member");
    project.members.push(member.id.clone());
    member
}

/// A valid task with defaults everywhere except title and creator.
pub fn sample_task(project_id: &str, title: &str, creator_id: &str) -> Task {
    Task::new(
        project_id,
        NewTask {
            title: title.into(),
            description: format!("{} description", title),
            status: Default::default(),
            priority: Default::default(),
            due_date: Utc::now() + Duration::days(7),
            assignee_id: None,
            creator_id: creator_id.into(),
            tags: Vec::new(),
        },
    )
}
