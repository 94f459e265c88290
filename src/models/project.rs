use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{new_id, ProjectMember, TaskDetail};

/// A project document. `tasks` and `members` are the authoritative id lists
/// of what the project owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub color: String,
    #[serde(default)]
    pub tasks: Vec<String>,
    #[serde(default)]
    pub members: Vec<String>,
    pub creator_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A project with tasks (and their comments) and members inlined.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetail {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub color: String,
    #[serde(default)]
    pub tasks: Vec<TaskDetail>,
    #[serde(default)]
    pub members: Vec<ProjectMember>,
    pub creator_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Scalar fields a partial project edit may set. The id lists are only ever
/// changed through the store's push/pull operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl ProjectChanges {
    pub fn apply(&self, project: &mut Project) {
        if let Some(name) = &self.name {
            project.name = name.clone();
        }
        if let Some(description) = &self.description {
            project.description = description.clone();
        }
    }
}

impl Project {
    pub fn new(name: String, description: String, color: String, creator_id: String) -> Self {
        let now = Utc::now();
        Project {
            id: new_id(),
            name,
            description,
            color,
            tasks: Vec::new(),
            members: Vec::new(),
            creator_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn into_detail(self, tasks: Vec<TaskDetail>, members: Vec<ProjectMember>) -> ProjectDetail {
        ProjectDetail {
            id: self.id,
            name: self.name,
            description: self.description,
            color: self.color,
            tasks,
            members,
            creator_id: self.creator_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
