//! Core traits for tareas abstractions.
//!
//! These traits define the storage-engine contract the record mutator
//! depends on, enabling pluggable backends and testability with fakes.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::*;

/// Repository for task rows.
///
/// Implementations execute single parameterized statements against the
/// storage engine; they do not touch the filesystem. The connection
/// handle is passed in at construction, never held as ambient global
/// state.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// List tasks matching the filter, newest first.
    async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>>;

    /// Fetch a single task by id.
    ///
    /// Returns [`crate::Error::TaskNotFound`] when no row exists.
    async fn fetch(&self, id: i64) -> Result<Task>;

    /// Insert a new task, returning the created row (with
    /// storage-assigned `id` and `created_at`).
    async fn insert(&self, task: CreateTask) -> Result<Task>;

    /// Apply a partial update, returning the updated row.
    ///
    /// `image_path`, when present, replaces the stored reference.
    /// Fails with [`crate::Error::Validation`] when neither a field
    /// nor an image path is supplied, and with
    /// [`crate::Error::TaskNotFound`] when the row is missing.
    async fn update(
        &self,
        id: i64,
        fields: &UpdateTaskFields,
        image_path: Option<&str>,
    ) -> Result<Task>;

    /// Delete a task row.
    ///
    /// Returns [`crate::Error::TaskNotFound`] when no row exists.
    async fn delete(&self, id: i64) -> Result<()>;

    /// Check whether a task exists.
    async fn exists(&self, id: i64) -> Result<bool>;
}
