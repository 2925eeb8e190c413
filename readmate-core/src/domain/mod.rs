//! Core domain entities
//!
//! Plain data structures plus validation. No I/O happens here; the document
//! mapping only converts to and from the schemaless store representation.

mod task;
mod user;
pub mod result;
pub mod validation;

pub use result::{Error, IdentityError, OperationResult, Result, UserMessage, ValidationError};
pub use task::{fields as task_fields, NewTask, Task, TASKS_COLLECTION};
pub use user::{User, USERS_COLLECTION};

/// Document fields holding epoch-millis timestamps
///
/// Stores with a native timestamp type write these fields with it.
pub const TIMESTAMP_FIELDS: &[&str] = &[task::fields::DUE_AT, user::CREATED_AT];

/// A schemaless document as held by the document store
pub type Document = serde_json::Map<String, serde_json::Value>;
