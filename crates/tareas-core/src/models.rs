//! Core data models for tareas.
//!
//! These types are shared across all tareas crates and represent the
//! task domain entities exchanged between the database layer, the HTTP
//! API, and the client library.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Task priority level.
///
/// Stored in the database as lowercase text (`baja`, `media`, `alta`)
/// and serialized the same way over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Baja,
    #[default]
    Media,
    Alta,
}

impl Priority {
    /// Database/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Baja => "baja",
            Priority::Media => "media",
            Priority::Alta => "alta",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "baja" => Ok(Priority::Baja),
            "media" => Ok(Priority::Media),
            "alta" => Ok(Priority::Alta),
            other => Err(format!(
                "invalid priority '{}': expected one of baja, media, alta",
                other
            )),
        }
    }
}

/// A persisted task record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Storage-assigned primary key, immutable after creation.
    pub id: i64,
    pub description: String,
    pub deadline: DateTime<Utc>,
    pub priority: Priority,
    pub completed: bool,
    /// Relative reference (`/images/<name>`) to the stored attachment,
    /// or `None` when the task has no image. Non-null exactly when the
    /// file exists on disk.
    pub image_path: Option<String>,
    /// Set once at creation; default list ordering key (descending).
    pub created_at: DateTime<Utc>,
}

/// Fields required to create a task.
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub description: String,
    pub deadline: DateTime<Utc>,
    /// Defaults to [`Priority::Media`] when omitted.
    pub priority: Option<Priority>,
    /// Relative path of an already-stored image, if any.
    pub image_path: Option<String>,
}

/// Partial field set for updating a task.
///
/// Absent fields retain their prior values. The new image path (if a
/// file was uploaded) travels separately, because its lifecycle is
/// owned by the record mutator.
#[derive(Debug, Clone, Default)]
pub struct UpdateTaskFields {
    pub description: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
}

impl UpdateTaskFields {
    /// True when no updatable field is present.
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.deadline.is_none()
            && self.priority.is_none()
            && self.completed.is_none()
    }
}

/// Optional filter criteria for listing tasks.
///
/// All fields are independent; an empty filter returns the full set
/// ordered by creation time, most recent first.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Case-insensitive substring match against `description`.
    pub search: Option<String>,
    /// Exact priority match.
    pub priority: Option<Priority>,
    /// Inclusive lower bound on `deadline`.
    pub date_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `deadline`.
    pub date_to: Option<DateTime<Utc>>,
}

impl TaskFilter {
    /// True when no filter criterion is present.
    pub fn is_empty(&self) -> bool {
        self.search.is_none()
            && self.priority.is_none()
            && self.date_from.is_none()
            && self.date_to.is_none()
    }
}

/// An uploaded image awaiting storage.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Client-supplied filename, used only for its extension.
    pub filename: String,
    pub data: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_roundtrip() {
        for p in [Priority::Baja, Priority::Media, Priority::Alta] {
            assert_eq!(p.as_str().parse::<Priority>().unwrap(), p);
        }
    }

    #[test]
    fn test_priority_parse_trims_and_lowercases() {
        assert_eq!(" ALTA ".parse::<Priority>().unwrap(), Priority::Alta);
    }

    #[test]
    fn test_priority_parse_rejects_unknown() {
        let err = "urgent".parse::<Priority>().unwrap_err();
        assert!(err.contains("urgent"));
    }

    #[test]
    fn test_priority_default_is_media() {
        assert_eq!(Priority::default(), Priority::Media);
    }

    #[test]
    fn test_priority_serde_lowercase() {
        let json = serde_json::to_string(&Priority::Alta).unwrap();
        assert_eq!(json, "\"alta\"");
        let parsed: Priority = serde_json::from_str("\"baja\"").unwrap();
        assert_eq!(parsed, Priority::Baja);
    }

    #[test]
    fn test_update_fields_is_empty() {
        assert!(UpdateTaskFields::default().is_empty());
        let fields = UpdateTaskFields {
            completed: Some(true),
            ..Default::default()
        };
        assert!(!fields.is_empty());
    }

    #[test]
    fn test_task_filter_is_empty() {
        assert!(TaskFilter::default().is_empty());
        let filter = TaskFilter {
            search: Some("foo".into()),
            ..Default::default()
        };
        assert!(!filter.is_empty());
    }

    #[test]
    fn test_task_serde_roundtrip() {
        let task = Task {
            id: 7,
            description: "comprar pan".into(),
            deadline: Utc::now(),
            priority: Priority::Baja,
            completed: false,
            image_path: Some("/images/abc.png".into()),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&task).unwrap();
        let back: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(back, task);
    }
}
