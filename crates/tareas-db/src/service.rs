//! Attachment-synchronized task mutation service.
//!
//! Create, update, and delete each span two storage systems: the task
//! row and the on-disk image file. There is no two-phase commit across
//! them, so every mutation runs a short compensating-action sequence:
//! store the file, attempt the database write, undo the file on
//! failure, and perform the now-safe cleanup (superseded image
//! deletion) only after the database write succeeds.
//!
//! The invariant observable at the return of every operation, success
//! or failure: no stored file without a row referencing it, and no row
//! referencing a file that does not exist.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use tareas_core::{
    CreateTask, Error, ImageUpload, Priority, Result, Task, TaskFilter, TaskRepository,
    UpdateTaskFields,
};

use crate::image_store::ImageStore;

/// Coordinates task-row mutations with the image file lifecycle.
pub struct TaskService {
    tasks: Arc<dyn TaskRepository>,
    images: Arc<dyn ImageStore>,
}

impl TaskService {
    /// Create a new service over the two storage collaborators.
    pub fn new(tasks: Arc<dyn TaskRepository>, images: Arc<dyn ImageStore>) -> Self {
        Self { tasks, images }
    }

    /// List tasks matching the filter, newest first.
    pub async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        self.tasks.list(filter).await
    }

    /// Fetch a single task.
    pub async fn get(&self, id: i64) -> Result<Task> {
        self.tasks.fetch(id).await
    }

    /// Create a task, optionally with an image attachment.
    ///
    /// The upload is stored before validation, mirroring an upload
    /// middleware that writes to disk ahead of the handler; every
    /// failure path afterwards removes the stored file before the
    /// error is surfaced.
    pub async fn create(
        &self,
        description: Option<String>,
        deadline: Option<DateTime<Utc>>,
        priority: Option<Priority>,
        upload: Option<ImageUpload>,
    ) -> Result<Task> {
        let image_path = match upload {
            Some(upload) => Some(self.images.store(&upload.filename, &upload.data).await?),
            None => None,
        };

        let description = match description.map(|d| d.trim().to_string()) {
            Some(d) if !d.is_empty() => d,
            _ => {
                self.discard_stored(image_path.as_deref()).await;
                return Err(Error::Validation(
                    "description and deadline are required".to_string(),
                ));
            }
        };
        let deadline = match deadline {
            Some(d) => d,
            None => {
                self.discard_stored(image_path.as_deref()).await;
                return Err(Error::Validation(
                    "description and deadline are required".to_string(),
                ));
            }
        };

        let result = self
            .tasks
            .insert(CreateTask {
                description,
                deadline,
                priority,
                image_path: image_path.clone(),
            })
            .await;

        match result {
            Ok(task) => {
                debug!(task_id = task.id, has_image = task.image_path.is_some(), "task created");
                Ok(task)
            }
            Err(err) => {
                self.discard_stored(image_path.as_deref()).await;
                Err(err)
            }
        }
    }

    /// Apply a partial update, optionally replacing the image.
    ///
    /// The superseded image is deleted only after the row points at
    /// the new one; a freshly stored image is deleted on every failure
    /// path, leaving the previous file (still referenced) intact.
    pub async fn update(
        &self,
        id: i64,
        fields: UpdateTaskFields,
        upload: Option<ImageUpload>,
    ) -> Result<Task> {
        let new_path = match upload {
            Some(upload) => Some(self.images.store(&upload.filename, &upload.data).await?),
            None => None,
        };

        let current = match self.tasks.fetch(id).await {
            Ok(task) => task,
            Err(err) => {
                self.discard_stored(new_path.as_deref()).await;
                return Err(err);
            }
        };

        if fields.is_empty() && new_path.is_none() {
            return Err(Error::Validation("no fields to update".to_string()));
        }

        let updated = match self.tasks.update(id, &fields, new_path.as_deref()).await {
            Ok(task) => task,
            Err(err) => {
                self.discard_stored(new_path.as_deref()).await;
                return Err(err);
            }
        };

        // The row now references the new file; the old one is safe to
        // remove. Failure here is non-fatal but worth a warning.
        if let (Some(old), Some(new)) = (&current.image_path, &new_path) {
            if old != new {
                if let Err(err) = self.images.delete(old).await {
                    warn!(task_id = id, image_path = %old, error = %err,
                        "failed to delete superseded image");
                }
            }
        }

        Ok(updated)
    }

    /// Delete a task and its image attachment, if any.
    ///
    /// The image delete is idempotent: a file already absent is not an
    /// error.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let task = self.tasks.fetch(id).await?;

        if let Some(image_path) = &task.image_path {
            self.images.delete(image_path).await?;
        }

        self.tasks.delete(id).await?;
        debug!(task_id = id, "task deleted");
        Ok(())
    }

    /// Remove a just-stored file on a failure path.
    ///
    /// A cleanup failure is logged but never masks the original error.
    async fn discard_stored(&self, path: Option<&str>) {
        if let Some(path) = path {
            if let Err(err) = self.images.delete(path).await {
                warn!(image_path = %path, error = %err, "failed to clean up stored image");
            }
        }
    }
}
