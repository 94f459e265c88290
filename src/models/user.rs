use serde::{Deserialize, Serialize};

use super::new_id;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

/// A registered account. Credential users carry a bcrypt hash, OAuth users a
/// provider id instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub google_id: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
}

impl User {
    pub fn with_password(name: String, email: String, password_hash: String, avatar_url: String) -> Self {
        User {
            id: new_id(),
            name,
            email,
            password: Some(password_hash),
            avatar_url: Some(avatar_url),
            role: UserRole::User,
            google_id: None,
            photo: None,
        }
    }

    pub fn from_google(google_id: String, name: String, email: String, photo: Option<String>) -> Self {
        User {
            id: new_id(),
            name,
            email,
            password: None,
            avatar_url: None,
            role: UserRole::User,
            google_id: Some(google_id),
            photo,
        }
    }
}

/// What the API hands back about a user. Never includes the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub role: UserRole,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        PublicUser {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            avatar_url: user.avatar_url.clone().or_else(|| user.photo.clone()),
            role: user.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_projection_hides_password() {
        let user = User::with_password(
            "Ada".into(),
            "ada@example.com".into(),
            "$2b$hash".into(),
            "https://img.example/ada.svg".into(),
        );
        let json = serde_json::to_value(PublicUser::from(&user)).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["id"], user.id.as_str());
        assert_eq!(json["role"], "user");
        assert_eq!(json["avatarUrl"], "https://img.example/ada.svg");
    }

    #[test]
    fn oauth_users_fall_back_to_provider_photo() {
        let user = User::from_google(
            "g-1".into(),
            "Grace".into(),
            "grace@example.com".into(),
            Some("https://photos.example/grace.png".into()),
        );
        let public = PublicUser::from(&user);
        assert_eq!(public.avatar_url.as_deref(), Some("https://photos.example/grace.png"));
        assert!(user.password.is_none());
    }
}
