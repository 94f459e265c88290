use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::new_id;

/// One line of a project's group chat. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    #[serde(rename = "_id")]
    pub id: String,
    pub project_id: String,
    pub user_id: String,
    pub user_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(project_id: &str, user_id: String, user_name: String, content: String) -> Self {
        ChatMessage {
            id: new_id(),
            project_id: project_id.to_string(),
            user_id,
            user_name,
            content,
            created_at: Utc::now(),
        }
    }
}
