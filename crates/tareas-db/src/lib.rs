//! # tareas-db
//!
//! PostgreSQL and filesystem storage layer for the tareas service.
//!
//! This crate provides:
//! - Connection pool management
//! - The task repository with dynamic filter and update queries
//! - The filesystem image store for task attachments
//! - [`TaskService`], which keeps the task row and its image file in
//!   lockstep across create, update, and delete
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tareas_db::{Database, FilesystemImageStore, TaskService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/tareas").await?;
//!     let images = Arc::new(FilesystemImageStore::new("public/images"));
//!     let service = TaskService::new(Arc::new(db.tasks), images);
//!
//!     let tasks = service.list(&Default::default()).await?;
//!     println!("{} tasks", tasks.len());
//!     Ok(())
//! }
//! ```

pub mod filter;
pub mod image_store;
pub mod pool;
pub mod service;
pub mod tasks;

// Re-export core types
pub use tareas_core::*;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

pub use filter::{QueryParam, TaskFilterQueryBuilder, UpdateQueryBuilder};
pub use image_store::{
    generate_image_name, FilesystemImageStore, ImageStore, IMAGE_PATH_PREFIX,
};
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use service::TaskService;
pub use tasks::PgTaskRepository;

/// Combined database context.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Task repository for row-level operations.
    pub tasks: PgTaskRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            tasks: PgTaskRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_plain_text_unchanged() {
        assert_eq!(escape_like("comprar pan"), "comprar pan");
    }

    #[test]
    fn test_escape_like_escapes_wildcards() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("c\\d"), "c\\\\d");
    }
}
