//! Change events pushed to peer sessions.

use serde::{Deserialize, Serialize};

/// What kind of mutation a [`ChangeEvent`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeKind {
    KeyAdded,
    KeyRenamed,
    KeyRemoved,
    ProjectCreated,
    DirectoryCreated,
}

/// Description of one successful mutation, delivered to every registered
/// session except the originator. Events are ephemeral and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    pub kind: ChangeKind,

    /// The project (or, for creations, the new node's id) the change applies to.
    pub project_id: String,

    /// Language document touched by key-level changes; absent for creations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Key path for key-level changes, parent directory path for creations.
    pub path: String,

    /// Operation-specific details, e.g. `{key, value}` or `{oldKey, newKey}`.
    pub payload: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_serializes_camel_case() {
        assert_eq!(
            serde_json::to_string(&ChangeKind::KeyAdded).unwrap(),
            "\"keyAdded\""
        );
        assert_eq!(
            serde_json::to_string(&ChangeKind::DirectoryCreated).unwrap(),
            "\"directoryCreated\""
        );
    }

    #[test]
    fn event_serializes_camel_case_fields() {
        let event = ChangeEvent {
            kind: ChangeKind::KeyAdded,
            project_id: "demo".to_string(),
            language: Some("en".to_string()),
            path: "greeting.morning".to_string(),
            payload: json!({"key": "greeting.morning", "value": "Good morning"}),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "keyAdded");
        assert_eq!(json["projectId"], "demo");
        assert_eq!(json["language"], "en");
        assert_eq!(json["path"], "greeting.morning");
    }

    #[test]
    fn absent_language_is_omitted() {
        let event = ChangeEvent {
            kind: ChangeKind::ProjectCreated,
            project_id: "p1".to_string(),
            language: None,
            path: "/".to_string(),
            payload: json!({"name": "Demo"}),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("language").is_none());
    }

    #[test]
    fn event_roundtrip() {
        let event = ChangeEvent {
            kind: ChangeKind::KeyRenamed,
            project_id: "demo".to_string(),
            language: Some("de".to_string()),
            path: "title.new".to_string(),
            payload: json!({"oldKey": "title.old", "newKey": "title.new"}),
        };
        let json = serde_json::to_string(&event).unwrap();
        let parsed: ChangeEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.kind, ChangeKind::KeyRenamed);
        assert_eq!(parsed.language.as_deref(), Some("de"));
    }
}
