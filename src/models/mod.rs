pub mod chat;
pub mod comment;
pub mod member;
pub mod payload;
pub mod project;
pub mod task;
pub mod user;

use std::collections::HashMap;

use mongodb::bson::oid::ObjectId;
use serde::de::value::StringDeserializer;
use serde::de::{DeserializeOwned, IntoDeserializer};
use serde::{Deserialize, Deserializer};

pub use chat::ChatMessage;
pub use comment::Comment;
pub use member::{MemberRole, ProjectMember};
pub use project::{Project, ProjectChanges, ProjectDetail};
pub use task::{Task, TaskChanges, TaskDetail, TaskPriority, TaskStatus};
pub use user::{PublicUser, User, UserRole};

/// Generates a fresh document id (24 hex digits, ObjectId layout).
pub fn new_id() -> String {
    ObjectId::new().to_hex()
}

/// True when `id` has the shape of a document id.
pub fn is_valid_id(id: &str) -> bool {
    ObjectId::parse_str(id).is_ok()
}

/// Treats an empty string the same as an absent value.
pub fn filled(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Reorders `docs` to follow `ids`, dropping ids with no matching document.
pub fn order_by_ids<T>(docs: Vec<T>, ids: &[String], id_of: impl Fn(&T) -> &str) -> Vec<T> {
    let mut by_id: HashMap<String, T> = docs
        .into_iter()
        .map(|doc| (id_of(&doc).to_string(), doc))
        .collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}

/// Lets an `Option<Option<T>>` field tell "absent" (outer `None`) from an
/// explicit `null` (`Some(None)`). Use together with `#[serde(default)]`.
pub(crate) fn explicit<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Reads a string-encoded field (enum name, timestamp) where `""` and `null`
/// both mean "not supplied". Use together with `#[serde(default)]`.
pub(crate) fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.is_empty() => {
            let inner: StringDeserializer<D::Error> = raw.into_deserializer();
            T::deserialize(inner).map(Some)
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_valid() {
        let id = new_id();
        assert_eq!(id.len(), 24);
        assert!(is_valid_id(&id));
        assert!(!is_valid_id("not-an-id"));
        assert!(!is_valid_id(""));
    }

    #[test]
    fn order_by_ids_follows_reference_list_and_skips_dangling() {
        let docs = vec!["b".to_string(), "a".to_string(), "c".to_string()];
        let ids = vec!["c".to_string(), "missing".to_string(), "a".to_string()];
        let ordered = order_by_ids(docs, &ids, |d| d.as_str());
        assert_eq!(ordered, vec!["c".to_string(), "a".to_string()]);
    }

    #[test]
    fn filled_drops_empty_strings() {
        assert_eq!(filled(Some(String::new())), None);
        assert_eq!(filled(None), None);
        assert_eq!(filled(Some("x".into())), Some("x".into()));
    }
}
