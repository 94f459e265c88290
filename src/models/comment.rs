use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::new_id;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(rename = "_id")]
    pub id: String,
    pub content: String,
    pub user_id: String,
    pub task_id: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(task_id: &str, content: String, user_id: String) -> Self {
        Comment {
            id: new_id(),
            content,
            user_id,
            task_id: task_id.to_string(),
            created_at: Utc::now(),
        }
    }
}
