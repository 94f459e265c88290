//! Request and response bodies shared by the HTTP handlers and `ApiClient`.
//!
//! Required fields are still `Option` here so a missing field is reported as a
//! validation error with a readable message instead of a bare decode failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MemberRole, TaskPriority, TaskStatus};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignupInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarUpdated {
    pub message: String,
    pub avatar_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        MessageResponse { message: message.into() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequesterQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMemberRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<MemberRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<NewMemberRequest>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProjectRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InviteRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<MemberRole>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPost {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "super::blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<TaskStatus>,
    #[serde(
        default,
        deserialize_with = "super::blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub priority: Option<TaskPriority>,
    #[serde(
        default,
        deserialize_with = "super::blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

/// Partial task edit. Empty strings count as "not supplied", for the enum
/// and date fields too; `assigneeId` may be sent as `null` to unassign.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "super::blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<TaskStatus>,
    #[serde(
        default,
        deserialize_with = "super::blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub priority: Option<TaskPriority>,
    #[serde(
        default,
        deserialize_with = "super::blank_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "super::explicit",
        skip_serializing_if = "Option::is_none"
    )]
    pub assignee_id: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCommentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub database: String,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignee_distinguishes_null_from_absent() {
        let absent: UpdateTaskRequest = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert_eq!(absent.assignee_id, None);

        let cleared: UpdateTaskRequest = serde_json::from_str(r#"{"assigneeId":null}"#).unwrap();
        assert_eq!(cleared.assignee_id, Some(None));

        let set: UpdateTaskRequest = serde_json::from_str(r#"{"assigneeId":"u2"}"#).unwrap();
        assert_eq!(set.assignee_id, Some(Some("u2".to_string())));
    }

    #[test]
    fn blank_enum_and_date_fields_are_treated_as_absent() {
        let req: UpdateTaskRequest =
            serde_json::from_str(r#"{"title":"New","status":"","priority":"","dueDate":""}"#).unwrap();
        assert_eq!(req.title.as_deref(), Some("New"));
        assert_eq!(req.status, None);
        assert_eq!(req.priority, None);
        assert_eq!(req.due_date, None);

        let req: UpdateTaskRequest =
            serde_json::from_str(r#"{"status":"in-progress","dueDate":"2026-02-01T10:00:00Z"}"#).unwrap();
        assert_eq!(req.status, Some(TaskStatus::InProgress));
        assert!(req.due_date.is_some());

        let req: CreateTaskRequest = serde_json::from_str(r#"{"priority":null}"#).unwrap();
        assert_eq!(req.priority, None);
    }

    #[test]
    fn unknown_status_is_still_rejected() {
        assert!(serde_json::from_str::<UpdateTaskRequest>(r#"{"status":"blocked"}"#).is_err());
    }

    #[test]
    fn cleared_assignee_serializes_as_null() {
        let req = UpdateTaskRequest {
            assignee_id: Some(None),
            ..Default::default()
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json.get("assigneeId"), Some(&serde_json::Value::Null));
        assert!(json.get("title").is_none());
    }
}
