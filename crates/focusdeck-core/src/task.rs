//! Task list model.
//!
//! Tasks live in the local SQLite table and mirror the remote bulk-sync
//! collection one-for-one; the serde names match the wire format of that
//! boundary (`createdAt`/`completedAt`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Lenient lookup: anything unrecognized is medium.
    pub fn parse_or_default(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Priority::Low,
            "high" => Priority::High,
            _ => Priority::Medium,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            priority: Priority::default(),
            completed: false,
            tags: Vec::new(),
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_task_defaults() {
        let task = Task::new("water the plants");
        assert_eq!(task.priority, Priority::Medium);
        assert!(!task.completed);
        assert!(task.tags.is_empty());
        assert!(task.completed_at.is_none());
        assert_eq!(task.id.len(), 36);
    }

    #[test]
    fn wire_format_is_camel_case() {
        let task = Task::new("ship it");
        let json = serde_json::to_value(&task).unwrap();
        assert!(json.get("createdAt").is_some());
        assert!(json.get("completedAt").is_some());
        assert_eq!(json["priority"], "medium");
    }

    #[test]
    fn deserializes_sparse_wire_records() {
        let task: Task =
            serde_json::from_str(r#"{"id":"abc","text":"from the wire"}"#).unwrap();
        assert_eq!(task.id, "abc");
        assert_eq!(task.priority, Priority::Medium);
        assert!(!task.completed);
    }

    #[test]
    fn priority_parsing_is_lenient() {
        assert_eq!(Priority::parse_or_default("HIGH"), Priority::High);
        assert_eq!(Priority::parse_or_default("urgent"), Priority::Medium);
        assert_eq!(Priority::parse_or_default("low"), Priority::Low);
    }
}
