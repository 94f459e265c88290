use serde::{Deserialize, Serialize};

use super::new_id;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Admin,
    #[default]
    Member,
    Viewer,
}

/// Membership of one person in one project. Separate from the global `User`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMember {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: MemberRole,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub project_id: String,
}

impl ProjectMember {
    pub fn new(
        project_id: &str,
        name: String,
        email: String,
        role: MemberRole,
        avatar_url: Option<String>,
    ) -> Self {
        ProjectMember {
            id: new_id(),
            name,
            email,
            role,
            avatar_url,
            project_id: project_id.to_string(),
        }
    }
}
