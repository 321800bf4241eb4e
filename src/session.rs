//! One open project: its frames, shots and task board.
//!
//! DESIGN
//! ======
//! A session is what a route owns while it is mounted. Leaving the route
//! (navigation or page unload) calls [`Session::leave`], which flushes every
//! pending save of both collections so no edit is lost to a cancelled timer.
//!
//! ERROR HANDLING
//! ==============
//! Upload validation runs before any state is touched; a rejected image
//! surfaces as [`SessionError::Upload`] whose `Display` is user-facing.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::sync::Arc;

use tracing::info;

use crate::collection::{Collection, CollectionError};
use crate::config::Config;
use crate::item::{Frame, ItemId, Shot};
use crate::media::{ImageUpload, UploadError, UploadPolicy};
use crate::remote::http::{ApiClient, HttpRemote};
use crate::remote::{Remote, RemoteError};
use crate::tasks::{HttpTaskRemote, TaskBoard, TaskError, TaskRemote};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Collection(#[from] CollectionError),
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl crate::error::ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Upload(e) => e.error_code(),
            Self::Collection(e) => e.error_code(),
            Self::Task(e) => e.error_code(),
            Self::Remote(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Upload(e) => e.retryable(),
            Self::Collection(e) => e.retryable(),
            Self::Task(e) => e.retryable(),
            Self::Remote(e) => e.retryable(),
        }
    }
}

/// Why the session is being torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveReason {
    /// In-app route change.
    Navigate,
    /// Tab close or reload.
    Unload,
}

pub struct Session {
    frames: Collection<Frame>,
    shots: Collection<Shot>,
    tasks: TaskBoard,
    upload: UploadPolicy,
}

impl Session {
    #[must_use]
    pub fn new(
        frames: Collection<Frame>,
        shots: Collection<Shot>,
        tasks: TaskBoard,
        upload: UploadPolicy,
    ) -> Self {
        Self { frames, shots, tasks, upload }
    }

    /// Wire HTTP remotes for one storyboard and its project.
    ///
    /// # Errors
    ///
    /// Returns `ClientBuild` if the HTTP client cannot be constructed.
    pub fn connect(config: &Config, storyboard_id: ItemId, project_id: ItemId) -> Result<Self, RemoteError> {
        let api = ApiClient::new(&config.api)?;
        let autosave = &config.autosave;

        let frame_remote: Arc<dyn Remote<Frame>> = Arc::new(HttpRemote::new(api.clone(), storyboard_id));
        let shot_remote: Arc<dyn Remote<Shot>> = Arc::new(HttpRemote::new(api.clone(), project_id));
        let task_remote: Arc<dyn TaskRemote> = Arc::new(HttpTaskRemote::new(api, project_id));

        info!(%storyboard_id, %project_id, base_url = %config.api.base_url, "session connected");
        Ok(Self::new(
            Collection::new(frame_remote, autosave.save_delay(), autosave.frame_render_delay()),
            Collection::new(shot_remote, autosave.save_delay(), autosave.shot_render_delay()),
            TaskBoard::new(task_remote),
            config.upload,
        ))
    }

    #[must_use]
    pub fn frames(&self) -> &Collection<Frame> {
        &self.frames
    }

    #[must_use]
    pub fn shots(&self) -> &Collection<Shot> {
        &self.shots
    }

    #[must_use]
    pub fn tasks(&self) -> &TaskBoard {
        &self.tasks
    }

    /// Load frames, shots and tasks concurrently.
    ///
    /// # Errors
    ///
    /// Returns the first failure; collections that did load keep their items.
    pub async fn load_all(&self) -> Result<(), SessionError> {
        let (frames, shots, tasks) = tokio::join!(self.frames.load(), self.shots.load(), self.tasks.load());
        frames?;
        shots?;
        tasks?;
        Ok(())
    }

    /// Flush every pending save before the route goes away.
    ///
    /// Returns how many saves succeeded. Failures stay marked dirty.
    pub async fn leave(&self, reason: LeaveReason) -> usize {
        let (frames, shots) = tokio::join!(self.frames.flush_all(), self.shots.flush_all());
        let unsaved = self.frames.unsaved().len() + self.shots.unsaved().len();
        info!(?reason, saved = frames + shots, unsaved, "session left");
        frames + shots
    }

    /// Validate an upload, then set it as a frame's background image.
    ///
    /// `url` is where the host stored the file.
    ///
    /// # Errors
    ///
    /// Returns `Upload` for a rejected file (nothing changes) or `Collection`
    /// for an unknown frame.
    pub fn attach_frame_image(&self, id: ItemId, upload: &ImageUpload, url: String) -> Result<bool, SessionError> {
        self.upload.validate(upload)?;
        Ok(self.frames.set_background_image(id, Some(url))?)
    }

    /// Shot counterpart of [`Session::attach_frame_image`].
    ///
    /// # Errors
    ///
    /// Same as [`Session::attach_frame_image`].
    pub fn attach_shot_image(&self, id: ItemId, upload: &ImageUpload, url: String) -> Result<bool, SessionError> {
        self.upload.validate(upload)?;
        Ok(self.shots.set_background_image(id, Some(url))?)
    }
}
