use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{new_id, Comment};

/// Board column of a task. Any status may be set from any other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    Backlog,
    Todo,
    InProgress,
    Review,
    Completed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: TaskPriority,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub assignee_id: Option<String>,
    pub creator_id: String,
    #[serde(default)]
    pub attachments: Vec<String>,
    /// Comment ids, oldest first.
    #[serde(default)]
    pub comments: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub project_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task with its comments inlined.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDetail {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: DateTime<Utc>,
    pub assignee_id: Option<String>,
    pub creator_id: String,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub project_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: DateTime<Utc>,
    pub assignee_id: Option<String>,
    pub creator_id: String,
    pub tags: Vec<String>,
}

/// Scalar fields a partial task edit may set. `assignee_id: Some(None)`
/// unassigns. Comment ids are not editable here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
    pub assignee_id: Option<Option<String>>,
    pub tags: Option<Vec<String>>,
}

impl TaskChanges {
    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(assignee_id) = &self.assignee_id {
            task.assignee_id = assignee_id.clone();
        }
        if let Some(tags) = &self.tags {
            task.tags = tags.clone();
        }
    }
}

impl Task {
    pub fn new(project_id: &str, fields: NewTask) -> Self {
        let now = Utc::now();
        Task {
            id: new_id(),
            title: fields.title,
            description: fields.description,
            status: fields.status,
            priority: fields.priority,
            due_date: fields.due_date,
            assignee_id: fields.assignee_id,
            creator_id: fields.creator_id,
            attachments: Vec::new(),
            comments: Vec::new(),
            tags: fields.tags,
            project_id: project_id.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Inlines `comments`, which the caller has already put in task order.
    pub fn into_detail(self, comments: Vec<Comment>) -> TaskDetail {
        TaskDetail {
            id: self.id,
            title: self.title,
            description: self.description,
            status: self.status,
            priority: self.priority,
            due_date: self.due_date,
            assignee_id: self.assignee_id,
            creator_id: self.creator_id,
            attachments: self.attachments,
            comments,
            tags: self.tags,
            project_id: self.project_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_names_match_board_columns() {
        let names: Vec<_> = [
            TaskStatus::Backlog,
            TaskStatus::Todo,
            TaskStatus::InProgress,
            TaskStatus::Review,
            TaskStatus::Completed,
        ]
        .iter()
        .map(|s| serde_json::to_value(s).unwrap())
        .collect();
        assert_eq!(names, vec!["backlog", "todo", "in-progress", "review", "completed"]);
    }

    #[test]
    fn new_task_starts_without_comments_or_attachments() {
        let task = Task::new(
            "p1",
            NewTask {
                title: "Write docs".into(),
                description: "All of them".into(),
                status: TaskStatus::default(),
                priority: TaskPriority::default(),
                due_date: Utc::now(),
                assignee_id: None,
                creator_id: "u1".into(),
                tags: vec!["docs".into()],
            },
        );
        assert!(task.comments.is_empty());
        assert!(task.attachments.is_empty());
        assert_eq!(task.status, TaskStatus::Backlog);
        assert_eq!(task.priority, TaskPriority::Medium);

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["_id"], task.id.as_str());
        assert_eq!(json["projectId"], "p1");
        assert!(json["assigneeId"].is_null());
    }
}
