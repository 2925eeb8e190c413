//! New task form state

use chrono::{DateTime, Utc};

use crate::domain::result::Result;
use crate::domain::validation::validate_new_task;
use crate::domain::{NewTask, Task, UserMessage};
use crate::services::TaskService;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NewTaskStatus {
    #[default]
    Editing,
    Saving,
    Created(Task),
    Error(UserMessage),
}

#[derive(Debug, Clone)]
pub enum NewTaskEvent {
    TitleChanged(String),
    DescriptionChanged(String),
    DueChanged(Option<DateTime<Utc>>),
    ImageAttached(Vec<u8>),
    ImageCleared,
    Submitted,
    Created(Task),
    Failed(UserMessage),
}

#[derive(Debug, Default)]
pub struct NewTaskForm {
    title: String,
    description: String,
    due_at: Option<DateTime<Utc>>,
    image: Option<Vec<u8>>,
    status: NewTaskStatus,
}

impl NewTaskForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> &NewTaskStatus {
        &self.status
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    /// Title and description are both required
    pub fn can_submit(&self) -> bool {
        validate_new_task(&self.title, &self.description).is_ok()
    }

    pub fn apply(&mut self, event: NewTaskEvent) {
        match event {
            NewTaskEvent::TitleChanged(title) => self.title = title,
            NewTaskEvent::DescriptionChanged(description) => self.description = description,
            NewTaskEvent::DueChanged(due_at) => self.due_at = due_at,
            NewTaskEvent::ImageAttached(bytes) => self.image = Some(bytes),
            NewTaskEvent::ImageCleared => self.image = None,
            NewTaskEvent::Submitted => self.status = NewTaskStatus::Saving,
            NewTaskEvent::Created(task) => {
                *self = Self {
                    status: NewTaskStatus::Created(task),
                    ..Self::default()
                };
            }
            NewTaskEvent::Failed(message) => self.status = NewTaskStatus::Error(message),
        }
    }

    /// Save the attached image, then create the task
    ///
    /// The image is named after the current time in milliseconds. A missing
    /// due time means now.
    pub async fn create(&mut self, service: &TaskService, user_id: &str) -> Result<Task> {
        if let Err(e) = validate_new_task(&self.title, &self.description) {
            let e = crate::domain::Error::from(e);
            self.apply(NewTaskEvent::Failed(e.user_message()));
            return Err(e);
        }
        self.apply(NewTaskEvent::Submitted);

        match self.save(service, user_id).await {
            Ok(task) => {
                self.apply(NewTaskEvent::Created(task.clone()));
                Ok(task)
            }
            Err(e) => {
                self.apply(NewTaskEvent::Failed(e.user_message()));
                Err(e)
            }
        }
    }

    async fn save(&self, service: &TaskService, user_id: &str) -> Result<Task> {
        let mut new = NewTask::new(
            self.title.clone(),
            self.description.clone(),
            self.due_at.unwrap_or_else(Utc::now),
        );

        if let Some(bytes) = &self.image {
            let name = Utc::now().timestamp_millis().to_string();
            let path = service.save_image(bytes, &name).await?;
            new = new.with_image(path.to_string_lossy());
        }

        service.add_task(new, user_id).await
    }
}
