//! Kanban task board.
//!
//! DESIGN
//! ======
//! Tasks belong to a project and may point at the frame they were raised on.
//! Status changes are applied locally first so a card moves between columns
//! immediately; if the remote rejects the change the card is moved back and
//! the error is returned to the caller. Creates and deletes wait for the
//! remote before touching local state.

#[cfg(test)]
#[path = "tasks_test.rs"]
mod tasks_test;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::item::ItemId;
use crate::remote::RemoteError;
use crate::remote::http::{ApiClient, collection_url, field_url, item_url, parse_json};

// =============================================================================
// TYPES
// =============================================================================

/// Kanban column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    /// Columns in board order.
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Todo, TaskStatus::InProgress, TaskStatus::Done];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: ItemId,
    pub project_id: ItemId,
    /// Frame the task is attached to, if any.
    #[serde(default)]
    pub frame_id: Option<ItemId>,
    pub title: String,
    pub status: TaskStatus,
}

/// Body of a task creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTask {
    pub title: String,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_id: Option<ItemId>,
}

impl NewTask {
    #[must_use]
    pub fn todo(title: impl Into<String>) -> Self {
        Self { title: title.into(), status: TaskStatus::Todo, frame_id: None }
    }

    #[must_use]
    pub fn on_frame(mut self, frame_id: ItemId) -> Self {
        self.frame_id = Some(frame_id);
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("task not found: {0}")]
    NotFound(ItemId),
    #[error("remote call failed: {0}")]
    Remote(#[from] RemoteError),
}

impl crate::error::ErrorCode for TaskError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_TASK_NOT_FOUND",
            Self::Remote(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Remote(e) => e.retryable(),
            Self::NotFound(_) => false,
        }
    }
}

// =============================================================================
// REMOTE
// =============================================================================

/// Persistence operations for one project's tasks.
#[async_trait]
pub trait TaskRemote: Send + Sync {
    async fn list(&self) -> Result<Vec<Task>, RemoteError>;

    async fn create(&self, task: &NewTask) -> Result<Task, RemoteError>;

    async fn set_status(&self, id: ItemId, status: TaskStatus) -> Result<(), RemoteError>;

    async fn delete(&self, id: ItemId) -> Result<(), RemoteError>;
}

#[derive(Serialize)]
struct StatusBody {
    status: TaskStatus,
}

/// [`TaskRemote`] over the REST API.
pub struct HttpTaskRemote {
    api: ApiClient,
    project_id: ItemId,
}

impl HttpTaskRemote {
    #[must_use]
    pub fn new(api: ApiClient, project_id: ItemId) -> Self {
        Self { api, project_id }
    }

    fn list_url(&self) -> String {
        collection_url(self.api.base_url(), "projects", self.project_id, "tasks")
    }
}

#[async_trait]
impl TaskRemote for HttpTaskRemote {
    async fn list(&self) -> Result<Vec<Task>, RemoteError> {
        let text = self.api.get(&self.list_url()).await?;
        parse_json(&text)
    }

    async fn create(&self, task: &NewTask) -> Result<Task, RemoteError> {
        let text = self
            .api
            .send_json(Method::POST, &self.list_url(), task)
            .await?;
        parse_json(&text)
    }

    async fn set_status(&self, id: ItemId, status: TaskStatus) -> Result<(), RemoteError> {
        let url = field_url(self.api.base_url(), "tasks", id, "status");
        self.api
            .send_json(Method::PUT, &url, &StatusBody { status })
            .await?;
        Ok(())
    }

    async fn delete(&self, id: ItemId) -> Result<(), RemoteError> {
        self.api
            .delete(&item_url(self.api.base_url(), "tasks", id))
            .await
    }
}

// =============================================================================
// BOARD
// =============================================================================

/// Local view of a project's tasks.
pub struct TaskBoard {
    tasks: Mutex<Vec<Task>>,
    remote: Arc<dyn TaskRemote>,
}

impl TaskBoard {
    #[must_use]
    pub fn new(remote: Arc<dyn TaskRemote>) -> Self {
        Self { tasks: Mutex::new(Vec::new()), remote }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Task>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace local tasks with the remote listing.
    ///
    /// # Errors
    ///
    /// Returns the remote error; local tasks are untouched on failure.
    pub async fn load(&self) -> Result<usize, TaskError> {
        let tasks = self.remote.list().await?;
        let count = tasks.len();
        *self.lock() = tasks;
        info!(count, "task board loaded");
        Ok(count)
    }

    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.lock().clone()
    }

    #[must_use]
    pub fn get(&self, id: ItemId) -> Option<Task> {
        self.lock().iter().find(|t| t.id == id).cloned()
    }

    /// Tasks in one column, in creation order.
    #[must_use]
    pub fn column(&self, status: TaskStatus) -> Vec<Task> {
        self.lock()
            .iter()
            .filter(|t| t.status == status)
            .cloned()
            .collect()
    }

    /// Tasks attached to a frame.
    #[must_use]
    pub fn for_frame(&self, frame_id: ItemId) -> Vec<Task> {
        self.lock()
            .iter()
            .filter(|t| t.frame_id == Some(frame_id))
            .cloned()
            .collect()
    }

    /// # Errors
    ///
    /// Returns the remote error; nothing is added locally on failure.
    pub async fn create(&self, task: NewTask) -> Result<Task, TaskError> {
        let created = self.remote.create(&task).await?;
        self.lock().push(created.clone());
        info!(id = %created.id, status = ?created.status, "task created");
        Ok(created)
    }

    /// Move a task to another column, optimistically.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, or the remote error after the previous status has
    /// been restored.
    pub async fn change_status(&self, id: ItemId, status: TaskStatus) -> Result<(), TaskError> {
        let previous = {
            let mut tasks = self.lock();
            let task = tasks
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or(TaskError::NotFound(id))?;
            std::mem::replace(&mut task.status, status)
        };
        if previous == status {
            return Ok(());
        }

        if let Err(e) = self.remote.set_status(id, status).await {
            warn!(%id, from = ?previous, to = ?status, error = %e, "status change rejected; rolling back");
            if let Some(task) = self.lock().iter_mut().find(|t| t.id == id) {
                task.status = previous;
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `NotFound`, or the remote error with the task kept locally.
    pub async fn delete(&self, id: ItemId) -> Result<(), TaskError> {
        if self.get(id).is_none() {
            return Err(TaskError::NotFound(id));
        }
        self.remote.delete(id).await?;
        self.lock().retain(|t| t.id != id);
        info!(%id, "task deleted");
        Ok(())
    }
}
