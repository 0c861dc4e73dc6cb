use serde::{Deserialize, Serialize};

/// A task record as stored and served over the wire.
///
/// `id == 0` means "not yet persisted" — the store assigns the real id on
/// insert. Timestamps are RFC 3339 strings; `created_at` is set once at
/// insert, `updated_at` is refreshed on every successful mutation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Creation payload. `title` is validated by the manager, not here.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

/// Partial update. Absent fields leave the stored record unchanged;
/// `description: Some("")` overwrites with the empty string.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

/// Aggregate counts served by the statistics endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    pub completed: i64,
    pub pending: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_serializes_camel_case() {
        let task = Task {
            id: 7,
            title: "Buy milk".into(),
            description: None,
            completed: false,
            created_at: "2026-02-14T12:00:00Z".into(),
            updated_at: "2026-02-14T12:00:00Z".into(),
        };
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["createdAt"], "2026-02-14T12:00:00Z");
        assert_eq!(json["updatedAt"], "2026-02-14T12:00:00Z");
        assert!(json["description"].is_null());
    }

    #[test]
    fn patch_absent_fields_deserialize_to_none() {
        let patch: TaskPatch = serde_json::from_str(r#"{"description":"d2"}"#).unwrap();
        assert!(patch.title.is_none());
        assert_eq!(patch.description.as_deref(), Some("d2"));
        assert!(patch.completed.is_none());
    }

    #[test]
    fn new_task_tolerates_empty_body() {
        let new: NewTask = serde_json::from_str("{}").unwrap();
        assert!(new.title.is_none());
        assert!(new.completed.is_none());
    }

    #[test]
    fn task_roundtrip() {
        let task = Task {
            id: 1,
            title: "t".into(),
            description: Some("d".into()),
            completed: true,
            created_at: "2026-02-14T12:00:00Z".into(),
            updated_at: "2026-02-14T13:00:00Z".into(),
        };
        let json = serde_json::to_string(&task).unwrap();
        let parsed: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, task);
    }
}
