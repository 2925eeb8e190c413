//! Integration tests for readmate-core services
//!
//! Tasks are stored in a real DuckDB document store and images in a temporary
//! directory. The identity service is the in-memory adapter so tests can
//! count calls and simulate an unreachable network.
//!
//! Run with: cargo test --test integration_tests -- --nocapture

use std::path::Path;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::json;
use tempfile::TempDir;

use readmate_core::adapters::duckdb::{DuckDbDocumentStore, LocalDatabase};
use readmate_core::adapters::local_files::LocalFileStore;
use readmate_core::adapters::memory::{InMemoryDocumentStore, InMemoryIdentityProvider};
use readmate_core::config::{Backend, Config};
use readmate_core::domain::{Document, ValidationError, TASKS_COLLECTION, USERS_COLLECTION};
use readmate_core::ports::DocumentStore;
use readmate_core::state::{TaskListState, TaskListStatus};
use readmate_core::{Error, NewTask, ReadmateContext, UserMessage};

// ============================================================================
// Test Helpers
// ============================================================================

const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

struct Harness {
    _dir: TempDir,
    identity: Arc<InMemoryIdentityProvider>,
    store: Arc<dyn DocumentStore>,
    ctx: ReadmateContext,
}

/// Context over in-memory identity, DuckDB documents and a temp image dir
fn duckdb_harness() -> Harness {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db = LocalDatabase::open_in_memory().expect("Failed to open database");
    db.ensure_schema().expect("Failed to initialize schema");

    let identity = Arc::new(InMemoryIdentityProvider::new());
    let store: Arc<dyn DocumentStore> = Arc::new(DuckDbDocumentStore::new(Arc::new(db)));
    let files = Arc::new(LocalFileStore::new(dir.path().join("images")));

    let ctx = ReadmateContext::with_ports(
        Config::default(),
        dir.path(),
        identity.clone(),
        store.clone(),
        files,
    );
    Harness {
        _dir: dir,
        identity,
        store,
        ctx,
    }
}

/// Context over in-memory identity and documents, for call counting
fn memory_harness() -> (TempDir, Arc<InMemoryIdentityProvider>, Arc<InMemoryDocumentStore>, ReadmateContext) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let identity = Arc::new(InMemoryIdentityProvider::new());
    let store = Arc::new(InMemoryDocumentStore::new());
    let files = Arc::new(LocalFileStore::new(dir.path().join("images")));
    let ctx = ReadmateContext::with_ports(
        Config::default(),
        dir.path(),
        identity.clone(),
        store.clone(),
        files,
    );
    (dir, identity, store, ctx)
}

async fn sign_up(ctx: &ReadmateContext) -> String {
    ctx.auth_service
        .register("ana@example.com", "Secret1", "Ana Lopez")
        .await
        .expect("registration failed")
        .id
}

fn new_task(title: &str) -> NewTask {
    NewTask::new(title, "Finish chapter 3", Utc.with_ymd_and_hms(2025, 5, 1, 18, 0, 0).unwrap())
}

fn doc(value: serde_json::Value) -> Document {
    value.as_object().cloned().expect("object literal")
}

fn write_settings(dir: &Path, backend: Backend) {
    let mut config = Config::default();
    config.set_backend(backend);
    config.save(dir).expect("Failed to save settings");
}

/// Context built from settings.json alone, unaffected by READMATE_* variables
fn context_from_settings(dir: &Path) -> anyhow::Result<ReadmateContext> {
    ReadmateContext::from_config(Config::load_file(dir)?, dir)
}

// ============================================================================
// Registration and Login
// ============================================================================

#[tokio::test]
async fn test_blank_registration_makes_no_remote_call() {
    let (_dir, identity, store, ctx) = memory_harness();

    for (email, password, username) in [
        ("", "Secret1", "Ana Lopez"),
        ("ana@example.com", "", "Ana Lopez"),
        ("ana@example.com", "Secret1", "   "),
    ] {
        let result = ctx.auth_service.register(email, password, username).await;
        assert!(matches!(result, Err(Error::Validation(ValidationError::EmptyFields))));
    }

    assert_eq!(identity.calls(), 0);
    assert_eq!(store.calls(), 0);
}

#[tokio::test]
async fn test_each_invalid_field_has_its_own_error() {
    let (_dir, identity, _store, ctx) = memory_harness();

    let bad_email = ctx.auth_service.register("ana.example.com", "Secret1", "Ana Lopez").await;
    let bad_username = ctx.auth_service.register("ana@example.com", "Secret1", "Ana").await;
    let bad_password = ctx.auth_service.register("ana@example.com", "secret", "Ana Lopez").await;

    let messages: Vec<UserMessage> = [bad_email, bad_username, bad_password]
        .into_iter()
        .map(|r| r.unwrap_err().user_message())
        .collect();
    assert_eq!(
        messages,
        vec![
            UserMessage::InvalidEmail,
            UserMessage::InvalidUsername,
            UserMessage::InvalidPassword
        ]
    );
    assert_eq!(identity.calls(), 0);
}

#[tokio::test]
async fn test_profile_write_failure_keeps_identity() {
    let (_dir, _identity, store, ctx) = memory_harness();
    store.fail_writes_to(USERS_COLLECTION);

    let result = ctx
        .auth_service
        .register("ana@example.com", "Secret1", "Ana Lopez")
        .await;
    assert!(matches!(result, Err(Error::ProfileWrite(_))));

    ctx.auth_service.logout().unwrap();
    let session = ctx.auth_service.login("ana@example.com", "Secret1").await.unwrap();
    assert_eq!(ctx.auth_service.get_current_user_id(), Some(session.user_id));
}

#[tokio::test]
async fn test_login_error_messages() {
    let h = duckdb_harness();
    sign_up(&h.ctx).await;
    h.ctx.auth_service.logout().unwrap();

    let wrong = h.ctx.auth_service.login("ana@example.com", "Wrong1").await.unwrap_err();
    let unknown = h.ctx.auth_service.login("bob@example.com", "Secret1").await.unwrap_err();
    assert_eq!(wrong.user_message(), UserMessage::InvalidCredentials);
    assert_eq!(unknown.user_message(), UserMessage::InvalidCredentials);

    h.identity.set_offline(true);
    let offline = h.ctx.auth_service.login("ana@example.com", "Secret1").await.unwrap_err();
    assert_eq!(offline.user_message(), UserMessage::Server);
}

// ============================================================================
// Task Lifecycle
// ============================================================================

#[tokio::test]
async fn test_added_task_is_downloaded_once() {
    let h = duckdb_harness();
    let user_id = sign_up(&h.ctx).await;

    let created = h.ctx.task_service.add_task(new_task("Read"), &user_id).await.unwrap();
    let tasks = h.ctx.task_service.download_tasks(&user_id).await.unwrap();

    let matching: Vec<_> = tasks.iter().filter(|t| t.id == created.id).collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].title, "Read");
    assert_eq!(matching[0].description, "Finish chapter 3");
    assert_eq!(matching[0].user_id, user_id);
    assert!(!matching[0].completed);
}

#[tokio::test]
async fn test_complete_changes_only_the_flag() {
    let h = duckdb_harness();
    let user_id = sign_up(&h.ctx).await;
    let created = h
        .ctx
        .task_service
        .add_task(new_task("Read").with_image("/tmp/cover.jpg"), &user_id)
        .await
        .unwrap();

    h.ctx.task_service.complete_task(&created.id).await.unwrap();

    let fetched = h.ctx.task_service.get_task(&created.id).await.unwrap();
    assert!(fetched.completed);
    assert_eq!(
        fetched,
        readmate_core::Task {
            completed: true,
            ..created
        }
    );
}

#[tokio::test]
async fn test_delete_removes_document_and_image() {
    let h = duckdb_harness();
    let user_id = sign_up(&h.ctx).await;

    let image = h.ctx.task_service.save_image(JPEG, "1714586400000").await.unwrap();
    assert!(image.exists());
    let created = h
        .ctx
        .task_service
        .add_task(new_task("Read").with_image(image.to_string_lossy()), &user_id)
        .await
        .unwrap();

    let outcome = h.ctx.task_service.delete_task(&created.id).await.unwrap();

    assert!(outcome.image_removed);
    assert!(!image.exists());
    assert!(h.store.get(TASKS_COLLECTION, &created.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_proceeds_when_image_cleanup_fails() {
    let h = duckdb_harness();
    let user_id = sign_up(&h.ctx).await;

    // A directory where the image should be cannot be removed as a file
    let blocker = h.ctx.task_service.images_dir().join("blocked.jpg");
    std::fs::create_dir_all(&blocker).unwrap();
    let created = h
        .ctx
        .task_service
        .add_task(new_task("Read").with_image(blocker.to_string_lossy()), &user_id)
        .await
        .unwrap();

    let outcome = h.ctx.task_service.delete_task(&created.id).await.unwrap();

    assert!(!outcome.image_removed);
    assert_eq!(outcome.warnings.len(), 1);
    assert!(h.store.get(TASKS_COLLECTION, &created.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_download_skips_malformed_documents() {
    let h = duckdb_harness();
    let user_id = sign_up(&h.ctx).await;
    h.ctx.task_service.add_task(new_task("Read"), &user_id).await.unwrap();

    h.store
        .set(TASKS_COLLECTION, "no-title", doc(json!({
            "id": "no-title", "descripcion": "x", "userId": user_id
        })))
        .await
        .unwrap();
    h.store
        .set(TASKS_COLLECTION, "numeric-title", doc(json!({
            "id": "numeric-title", "titulo": 7, "descripcion": "x", "userId": user_id
        })))
        .await
        .unwrap();
    h.store
        .set(TASKS_COLLECTION, "sparse", doc(json!({
            "id": "sparse", "titulo": "Sparse", "descripcion": "x", "userId": user_id
        })))
        .await
        .unwrap();

    let tasks = h.ctx.task_service.download_tasks(&user_id).await.unwrap();
    let titles: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();

    assert_eq!(tasks.len(), 2);
    assert!(titles.contains(&"Read"));
    let sparse = tasks.iter().find(|t| t.id == "sparse").unwrap();
    assert!(!sparse.completed);
}

#[tokio::test]
async fn test_task_list_state_follows_mutations() {
    let h = duckdb_harness();
    let user_id = sign_up(&h.ctx).await;
    let first = h.ctx.task_service.add_task(new_task("First"), &user_id).await.unwrap();
    h.ctx.task_service.add_task(new_task("Second"), &user_id).await.unwrap();

    let mut list = TaskListState::new();
    list.refresh(&h.ctx.task_service, &user_id).await.unwrap();
    assert_eq!(list.tasks().len(), 2);

    list.complete(&h.ctx.task_service, &first.id, &user_id).await.unwrap();
    assert_eq!(list.completed_count(), 1);

    list.delete(&h.ctx.task_service, &first.id, &user_id).await.unwrap();
    assert_eq!(list.status(), &TaskListStatus::Loaded);
    assert_eq!(list.tasks().len(), 1);
    assert_eq!(list.tasks()[0].title, "Second");
}

// ============================================================================
// Session Persistence
// ============================================================================

#[tokio::test]
async fn test_session_survives_new_context_and_logout_clears_it() {
    let dir = TempDir::new().unwrap();
    write_settings(dir.path(), Backend::Local);

    let user_id = {
        let ctx = context_from_settings(dir.path()).unwrap();
        assert_eq!(ctx.backend_name(), "local");
        sign_up(&ctx).await
    };

    let ctx = context_from_settings(dir.path()).unwrap();
    assert_eq!(ctx.auth_service.get_current_user_id(), Some(user_id.clone()));
    let profile = ctx.auth_service.get_user_details(&user_id).await.unwrap();
    assert_eq!(profile.username, "Ana Lopez");

    ctx.auth_service.logout().unwrap();
    assert!(ctx.auth_service.get_current_user_id().is_none());
    drop(ctx);

    let ctx = context_from_settings(dir.path()).unwrap();
    assert!(ctx.auth_service.get_current_user_id().is_none());
}

#[test]
fn test_firebase_backend_requires_project_settings() {
    let dir = TempDir::new().unwrap();
    write_settings(dir.path(), Backend::Firebase);
    assert!(context_from_settings(dir.path()).is_err());
}
