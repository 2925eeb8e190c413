//! User profile domain model

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Document;

/// Collection holding user profile documents, keyed by user id
pub const USERS_COLLECTION: &str = "Users";

/// Profile creation time, stored as a timestamp
pub const CREATED_AT: &str = "createdAt";

/// Profile of a registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub profile_image_url: String,
}

impl User {
    pub fn new(
        id: impl Into<String>,
        username: impl Into<String>,
        email: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            email: email.into(),
            created_at,
            profile_image_url: String::new(),
        }
    }

    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert("id".into(), Value::from(self.id.clone()));
        doc.insert("username".into(), Value::from(self.username.clone()));
        doc.insert("email".into(), Value::from(self.email.clone()));
        doc.insert(CREATED_AT.into(), Value::from(self.created_at.timestamp_millis()));
        doc.insert("profileImageUrl".into(), Value::from(self.profile_image_url.clone()));
        doc
    }

    /// Parse a profile document; the id falls back to the document key
    pub fn from_document(id: &str, doc: &Document) -> Option<Self> {
        let text = |key: &str| doc.get(key).and_then(Value::as_str).map(str::to_string);

        let created_at = doc
            .get(CREATED_AT)
            .and_then(Value::as_i64)
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
            .unwrap_or_else(Utc::now);

        Some(Self {
            id: text("id").unwrap_or_else(|| id.to_string()),
            username: text("username")?,
            email: text("email")?,
            created_at,
            profile_image_url: text("profileImageUrl").unwrap_or_default(),
        })
    }
}
