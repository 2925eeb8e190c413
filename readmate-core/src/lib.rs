//! ReadMate Core - Business logic for a personal task list
//!
//! This crate implements the core domain logic following hexagonal architecture:
//!
//! - **domain**: Core entities (User, Task), validation and errors
//! - **ports**: Trait definitions for external collaborators (IdentityProvider, DocumentStore, FileStore)
//! - **services**: Business logic orchestration (AuthService, TaskService, logging)
//! - **adapters**: Concrete implementations (DuckDB, Firebase, local files, in-memory)
//! - **state**: View-state containers driven by the services

pub mod adapters;
pub mod config;
pub mod domain;
pub mod log_migrations;
pub mod migrations;
pub mod ports;
pub mod services;
pub mod state;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use adapters::duckdb::{DuckDbDocumentStore, LocalDatabase};
use adapters::firebase::{FirebaseAuthProvider, FirestoreDocumentStore};
use adapters::local_files::LocalFileStore;
use adapters::local_identity::LocalIdentityProvider;
use adapters::memory::{InMemoryDocumentStore, InMemoryIdentityProvider};
use adapters::session::SessionStore;
use config::{Backend, Config};
use ports::{DocumentStore, FileStore, IdentityProvider};
use services::{AuthService, TaskService};

// Re-export commonly used types at crate root
pub use domain::result::{Error, OperationResult, UserMessage};
pub use domain::{NewTask, Task, User};
pub use ports::AuthSession;
pub use services::{EntryPoint, LogEvent, LoggingService};

/// Database file of the local backend
pub const DB_FILE: &str = "readmate.duckdb";

/// Directory task images are saved to
pub const IMAGES_DIR: &str = "images";

/// Main context for ReadMate operations
///
/// Loads the configuration, wires the adapters of the configured backend and
/// holds the services built on top of them.
pub struct ReadmateContext {
    pub config: Config,
    pub app_dir: PathBuf,
    pub auth_service: Arc<AuthService>,
    pub task_service: Arc<TaskService>,
}

impl ReadmateContext {
    /// Create a context for the application directory
    pub fn new(app_dir: &Path) -> Result<Self> {
        let config = Config::load(app_dir)?;
        Self::from_config(config, app_dir)
    }

    /// Create a context for an already loaded configuration
    pub fn from_config(config: Config, app_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(app_dir)?;
        let files: Arc<dyn FileStore> = Arc::new(LocalFileStore::new(app_dir.join(IMAGES_DIR)));

        let (identity, store): (Arc<dyn IdentityProvider>, Arc<dyn DocumentStore>) = match config.backend {
            Backend::Local => {
                let db = Arc::new(LocalDatabase::open(&app_dir.join(DB_FILE))?);
                db.ensure_schema()?;
                let session = Arc::new(SessionStore::in_dir(app_dir));
                let identity: Arc<dyn IdentityProvider> =
                    Arc::new(LocalIdentityProvider::new(Arc::clone(&db), session));
                let store: Arc<dyn DocumentStore> = Arc::new(DuckDbDocumentStore::new(db));
                (identity, store)
            }
            Backend::Firebase => {
                let session = Arc::new(SessionStore::in_dir(app_dir));
                let auth = Arc::new(FirebaseAuthProvider::new(&config.firebase, config.timeout(), session)?);
                let store: Arc<dyn DocumentStore> =
                    Arc::new(FirestoreDocumentStore::new(&config.firebase, Arc::clone(&auth))?);
                let identity: Arc<dyn IdentityProvider> = auth;
                (identity, store)
            }
            Backend::Memory => {
                let identity: Arc<dyn IdentityProvider> = Arc::new(InMemoryIdentityProvider::new());
                let store: Arc<dyn DocumentStore> = Arc::new(InMemoryDocumentStore::new());
                (identity, store)
            }
        };

        Ok(Self::with_ports(config, app_dir, identity, store, files))
    }

    /// Create a context from already built adapters
    pub fn with_ports(
        config: Config,
        app_dir: &Path,
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn DocumentStore>,
        files: Arc<dyn FileStore>,
    ) -> Self {
        Self {
            config,
            app_dir: app_dir.to_path_buf(),
            auth_service: Arc::new(AuthService::new(identity, Arc::clone(&store))),
            task_service: Arc::new(TaskService::new(store, files)),
        }
    }

    pub fn backend_name(&self) -> &str {
        self.auth_service.backend_name()
    }
}
