//! Home screen state - the signed-in user's task list
//!
//! Every mutation is followed by a full re-fetch, so the list always shows
//! what the store returned last.

use crate::domain::result::Result;
use crate::domain::{Task, UserMessage};
use crate::services::{TaskDeletion, TaskService};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TaskListStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error(UserMessage),
}

#[derive(Debug, Clone)]
pub enum TaskListEvent {
    Loading,
    Loaded(Vec<Task>),
    Failed(UserMessage),
}

#[derive(Debug, Default)]
pub struct TaskListState {
    status: TaskListStatus,
    tasks: Vec<Task>,
}

impl TaskListState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &TaskListStatus {
        &self.status
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn pending(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|t| !t.completed)
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    /// A failed load keeps the previously loaded tasks
    pub fn apply(&mut self, event: TaskListEvent) {
        match event {
            TaskListEvent::Loading => self.status = TaskListStatus::Loading,
            TaskListEvent::Loaded(tasks) => {
                self.tasks = tasks;
                self.status = TaskListStatus::Loaded;
            }
            TaskListEvent::Failed(message) => self.status = TaskListStatus::Error(message),
        }
    }

    pub async fn refresh(&mut self, service: &TaskService, user_id: &str) -> Result<&[Task]> {
        self.apply(TaskListEvent::Loading);
        match service.download_tasks(user_id).await {
            Ok(tasks) => {
                self.apply(TaskListEvent::Loaded(tasks));
                Ok(&self.tasks)
            }
            Err(e) => {
                self.apply(TaskListEvent::Failed(e.user_message()));
                Err(e)
            }
        }
    }

    pub async fn complete(&mut self, service: &TaskService, task_id: &str, user_id: &str) -> Result<()> {
        if let Err(e) = service.complete_task(task_id).await {
            self.apply(TaskListEvent::Failed(e.user_message()));
            return Err(e);
        }
        self.refresh(service, user_id).await?;
        Ok(())
    }

    pub async fn delete(
        &mut self,
        service: &TaskService,
        task_id: &str,
        user_id: &str,
    ) -> Result<TaskDeletion> {
        let outcome = match service.delete_task(task_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.apply(TaskListEvent::Failed(e.user_message()));
                return Err(e);
            }
        };
        self.refresh(service, user_id).await?;
        Ok(outcome)
    }
}
