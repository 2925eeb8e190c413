//! Service layer - business logic orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific use case or feature area.

mod auth;
pub mod logging;
pub mod migration;
mod task;

pub use auth::AuthService;
pub use logging::{EntryPoint, LogEntry, LogEvent, LoggingService};
pub use migration::{MigrationResult, MigrationService};
pub use task::{TaskDeletion, TaskService, IMAGE_EXTENSION};
