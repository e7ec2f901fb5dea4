//! Task repository implementation.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use tareas_core::{
    CreateTask, Error, Priority, Result, Task, TaskFilter, TaskRepository, UpdateTaskFields,
};

use crate::filter::{bind_params, TaskFilterQueryBuilder, UpdateQueryBuilder};

/// Columns selected for every task row.
const TASK_COLUMNS: &str = "id, description, deadline, priority, completed, image_path, created_at";

/// PostgreSQL implementation of [`TaskRepository`].
pub struct PgTaskRepository {
    pool: PgPool,
}

impl PgTaskRepository {
    /// Create a new PgTaskRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map a database row to a Task.
fn task_from_row(row: &sqlx::postgres::PgRow) -> Task {
    let priority: String = row.get("priority");
    Task {
        id: row.get("id"),
        description: row.get("description"),
        deadline: row.get("deadline"),
        // The CHECK constraint keeps this parseable; fall back to the
        // storage default rather than failing a read.
        priority: priority.parse().unwrap_or(Priority::Media),
        completed: row.get("completed"),
        image_path: row.get("image_path"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl TaskRepository for PgTaskRepository {
    async fn list(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let (sql, params) = TaskFilterQueryBuilder::new(filter.clone(), 0).build_list_query();

        let rows = bind_params(sqlx::query(&sql), &params)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(task_from_row).collect())
    }

    async fn fetch(&self, id: i64) -> Result<Task> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM task WHERE id = $1",
            TASK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::TaskNotFound(id))?;

        Ok(task_from_row(&row))
    }

    async fn insert(&self, task: CreateTask) -> Result<Task> {
        let row = sqlx::query(&format!(
            "INSERT INTO task (description, deadline, priority, image_path) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            TASK_COLUMNS
        ))
        .bind(&task.description)
        .bind(task.deadline)
        .bind(task.priority.unwrap_or_default().as_str())
        .bind(&task.image_path)
        .fetch_one(&self.pool)
        .await?;

        Ok(task_from_row(&row))
    }

    async fn update(
        &self,
        id: i64,
        fields: &UpdateTaskFields,
        image_path: Option<&str>,
    ) -> Result<Task> {
        let (sql, params) = UpdateQueryBuilder::new(fields, image_path).build(id)?;

        let row = bind_params(sqlx::query(&sql), &params)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(Error::TaskNotFound(id))?;

        Ok(task_from_row(&row))
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM task WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::TaskNotFound(id));
        }
        Ok(())
    }

    async fn exists(&self, id: i64) -> Result<bool> {
        let row = sqlx::query("SELECT 1 AS one FROM task WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}
