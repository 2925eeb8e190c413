//! Task domain model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Document;

/// Collection holding task documents
pub const TASKS_COLLECTION: &str = "Tasks";

/// Document field names, shared with the mobile app's `Tasks` collection
pub mod fields {
    pub const ID: &str = "id";
    pub const TITLE: &str = "titulo";
    pub const DESCRIPTION: &str = "descripcion";
    pub const COMPLETED: &str = "completada";
    /// Stored as a timestamp
    pub const DUE_AT: &str = "fecha";
    pub const IMAGE_PATH: &str = "imagenPath";
    pub const USER_ID: &str = "userId";
}

/// A to-do item owned by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    /// Due time as unix epoch milliseconds
    pub due_at: i64,
    pub user_id: String,
}

/// Input for creating a task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub due_at: DateTime<Utc>,
    pub image_path: Option<String>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, description: impl Into<String>, due_at: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            due_at,
            image_path: None,
        }
    }

    pub fn with_image(mut self, path: impl Into<String>) -> Self {
        self.image_path = Some(path.into());
        self
    }
}

impl Task {
    /// Build the task that `new` will become once stored under `id`
    pub fn from_new(id: impl Into<String>, new: &NewTask, user_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: new.title.clone(),
            description: new.description.clone(),
            completed: false,
            image_path: new.image_path.clone(),
            due_at: new.due_at.timestamp_millis(),
            user_id: user_id.into(),
        }
    }

    /// Serialise into the stored document shape
    ///
    /// `imagenPath` is only written when an image is attached. The due time
    /// is held as epoch millis; timestamp-capable stores convert it.
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(fields::ID.into(), Value::from(self.id.clone()));
        doc.insert(fields::TITLE.into(), Value::from(self.title.clone()));
        doc.insert(fields::DESCRIPTION.into(), Value::from(self.description.clone()));
        doc.insert(fields::COMPLETED.into(), Value::from(self.completed));
        doc.insert(fields::DUE_AT.into(), Value::from(self.due_at));
        doc.insert(fields::USER_ID.into(), Value::from(self.user_id.clone()));
        if let Some(path) = &self.image_path {
            doc.insert(fields::IMAGE_PATH.into(), Value::from(path.clone()));
        }
        doc
    }

    /// Parse a stored document
    ///
    /// Returns `None` for documents missing `id`, `titulo`, `descripcion` or
    /// the owner. A missing `completada` reads as false and a missing `fecha`
    /// reads as now.
    pub fn from_document(doc: &Document) -> Option<Self> {
        let id = doc.get(fields::ID)?.as_str()?.to_string();
        let title = doc.get(fields::TITLE)?.as_str()?.to_string();
        let description = doc.get(fields::DESCRIPTION)?.as_str()?.to_string();
        let user_id = doc.get(fields::USER_ID)?.as_str()?.to_string();

        let completed = doc
            .get(fields::COMPLETED)
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let due_at = doc
            .get(fields::DUE_AT)
            .and_then(Value::as_i64)
            .unwrap_or_else(|| Utc::now().timestamp_millis());
        let image_path = doc
            .get(fields::IMAGE_PATH)
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        Some(Self {
            id,
            title,
            description,
            completed,
            image_path,
            due_at,
            user_id,
        })
    }
}
