//! Task service - task documents and their local images

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::domain::result::{Error, Result, ValidationError};
use crate::domain::validation::is_jpeg;
use crate::domain::{task_fields, Document, NewTask, Task, TASKS_COLLECTION};
use crate::ports::{DocumentStore, FileStore};

pub const IMAGE_EXTENSION: &str = "jpg";

/// Outcome of `delete_task`
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskDeletion {
    pub task_id: String,
    /// Whether an attached image file was removed
    pub image_removed: bool,
    /// Image cleanup problems; the document is deleted regardless
    pub warnings: Vec<String>,
}

pub struct TaskService {
    store: Arc<dyn DocumentStore>,
    files: Arc<dyn FileStore>,
}

impl TaskService {
    pub fn new(store: Arc<dyn DocumentStore>, files: Arc<dyn FileStore>) -> Self {
        Self { store, files }
    }

    /// Directory images are saved to
    pub fn images_dir(&self) -> &Path {
        self.files.root()
    }

    /// Write a JPEG image as `<name>.jpg` and return its absolute path
    ///
    /// An existing file with the same name is overwritten.
    pub async fn save_image(&self, bytes: &[u8], name: &str) -> Result<PathBuf> {
        if !is_jpeg(bytes) {
            return Err(ValidationError::UnsupportedImage.into());
        }
        let file_name = format!("{name}.{IMAGE_EXTENSION}");
        self.files.write(Path::new(&file_name), bytes)
    }

    /// Store a new task owned by `user_id`
    pub async fn add_task(&self, new: NewTask, user_id: &str) -> Result<Task> {
        if user_id.trim().is_empty() {
            return Err(Error::NotAuthenticated);
        }

        let task = Task::from_new(self.store.new_id(), &new, user_id);
        self.store
            .set(TASKS_COLLECTION, &task.id, task.to_document())
            .await?;
        Ok(task)
    }

    /// Mark a task as completed
    pub async fn complete_task(&self, task_id: &str) -> Result<()> {
        let mut fields = Document::new();
        fields.insert(task_fields::COMPLETED.into(), Value::Bool(true));
        self.store.update(TASKS_COLLECTION, task_id, fields).await
    }

    /// Delete a task and, best effort, its image
    pub async fn delete_task(&self, task_id: &str) -> Result<TaskDeletion> {
        let mut outcome = TaskDeletion {
            task_id: task_id.to_string(),
            ..Default::default()
        };

        let image_path = self
            .store
            .get(TASKS_COLLECTION, task_id)
            .await?
            .and_then(|doc| {
                doc.get(task_fields::IMAGE_PATH)
                    .and_then(Value::as_str)
                    .filter(|p| !p.is_empty())
                    .map(PathBuf::from)
            });

        if let Some(path) = image_path {
            if self.files.exists(&path) {
                match self.files.delete(&path) {
                    Ok(()) => outcome.image_removed = true,
                    Err(e) => outcome
                        .warnings
                        .push(format!("could not delete image {}: {}", path.display(), e)),
                }
            }
        }

        self.store.delete(TASKS_COLLECTION, task_id).await?;
        Ok(outcome)
    }

    /// All tasks owned by `user_id`, ordered by due time then id
    ///
    /// Malformed documents are skipped.
    pub async fn download_tasks(&self, user_id: &str) -> Result<Vec<Task>> {
        let docs = self
            .store
            .query_eq(TASKS_COLLECTION, task_fields::USER_ID, &Value::from(user_id))
            .await?;

        let mut tasks: Vec<Task> = docs.iter().filter_map(Task::from_document).collect();
        tasks.sort_by(|a, b| a.due_at.cmp(&b.due_at).then_with(|| a.id.cmp(&b.id)));
        Ok(tasks)
    }

    pub async fn get_task(&self, task_id: &str) -> Result<Task> {
        self.store
            .get(TASKS_COLLECTION, task_id)
            .await?
            .as_ref()
            .and_then(Task::from_document)
            .ok_or_else(|| Error::not_found(format!("task {task_id}")))
    }

    /// Fetch a task only if `user_id` owns it
    ///
    /// Tasks of other users read as not found.
    pub async fn get_owned_task(&self, task_id: &str, user_id: &str) -> Result<Task> {
        let task = self.get_task(task_id).await?;
        if task.user_id != user_id {
            return Err(Error::not_found(format!("task {task_id}")));
        }
        Ok(task)
    }

    /// The task's image path, if the file is still there
    pub fn image_for_display(&self, task: &Task) -> Option<PathBuf> {
        task.image_path
            .as_deref()
            .map(PathBuf::from)
            .filter(|path| self.files.exists(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::local_files::LocalFileStore;
    use crate::adapters::memory::InMemoryDocumentStore;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use tempfile::TempDir;

    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

    fn service(dir: &TempDir) -> (Arc<InMemoryDocumentStore>, TaskService) {
        let store = Arc::new(InMemoryDocumentStore::new());
        let files = Arc::new(LocalFileStore::new(dir.path().join("images")));
        (store.clone(), TaskService::new(store, files))
    }

    fn due(day: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, day, 9, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_save_image_rejects_non_jpeg() {
        let dir = TempDir::new().unwrap();
        let (_, tasks) = service(&dir);

        let result = tasks.save_image(b"\x89PNG", "cover").await;
        assert!(matches!(result, Err(Error::Validation(ValidationError::UnsupportedImage))));

        let path = tasks.save_image(JPEG, "cover").await.unwrap();
        assert!(path.ends_with("images/cover.jpg"));
    }

    #[tokio::test]
    async fn test_add_task_requires_owner() {
        let dir = TempDir::new().unwrap();
        let (store, tasks) = service(&dir);

        let result = tasks.add_task(NewTask::new("Read", "Chapter 1", due(1)), " ").await;
        assert!(matches!(result, Err(Error::NotAuthenticated)));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_download_orders_by_due_time() {
        let dir = TempDir::new().unwrap();
        let (_, tasks) = service(&dir);

        tasks.add_task(NewTask::new("Later", "b", due(9)), "u1").await.unwrap();
        tasks.add_task(NewTask::new("Sooner", "a", due(2)), "u1").await.unwrap();
        tasks.add_task(NewTask::new("Other user", "c", due(1)), "u2").await.unwrap();

        let titles: Vec<String> = tasks
            .download_tasks("u1")
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["Sooner", "Later"]);
    }

    #[tokio::test]
    async fn test_complete_missing_task() {
        let dir = TempDir::new().unwrap();
        let (_, tasks) = service(&dir);
        assert!(matches!(tasks.complete_task("nope").await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_with_dangling_image_path() {
        let dir = TempDir::new().unwrap();
        let (_, tasks) = service(&dir);

        let new = NewTask::new("Read", "Chapter 1", due(1)).with_image("/nonexistent/x.jpg");
        let task = tasks.add_task(new, "u1").await.unwrap();

        let outcome = tasks.delete_task(&task.id).await.unwrap();
        assert!(!outcome.image_removed);
        assert!(outcome.warnings.is_empty());
        assert!(matches!(tasks.get_task(&task.id).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_owned_task_hides_other_users_tasks() {
        let dir = TempDir::new().unwrap();
        let (_store, tasks) = service(&dir);
        let task = tasks.add_task(NewTask::new("Read", "Chapter 3", due(1)), "u1").await.unwrap();

        assert_eq!(tasks.get_owned_task(&task.id, "u1").await.unwrap(), task);
        assert!(matches!(tasks.get_owned_task(&task.id, "u2").await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_image_for_display_skips_missing_files() {
        let dir = TempDir::new().unwrap();
        let (_store, tasks) = service(&dir);
        let path = tasks.save_image(JPEG, "cover").await.unwrap();

        let with_image = NewTask::new("Read", "Chapter 3", due(1)).with_image(path.to_string_lossy());
        let task = tasks.add_task(with_image, "u1").await.unwrap();
        assert_eq!(tasks.image_for_display(&task), Some(path.clone()));

        std::fs::remove_file(&path).unwrap();
        assert_eq!(tasks.image_for_display(&task), None);

        let plain = tasks.add_task(NewTask::new("Write", "Notes", due(2)), "u1").await.unwrap();
        assert_eq!(tasks.image_for_display(&plain), None);
    }

    #[tokio::test]
    async fn test_get_task_malformed_is_not_found() {
        let dir = TempDir::new().unwrap();
        let (store, tasks) = service(&dir);
        let doc = json!({"id": "bad", "userId": "u1"}).as_object().cloned().unwrap();
        store.insert_raw(TASKS_COLLECTION, "bad", doc);

        assert!(matches!(tasks.get_task("bad").await, Err(Error::NotFound(_))));
    }
}
