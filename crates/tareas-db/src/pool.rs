//! PostgreSQL connection pool setup.

use std::time::{Duration, Instant};

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use tareas_core::{Error, Result};

/// Pool sizing and timeout settings.
///
/// [`PoolConfig::from_env`] reads overrides from `DB_MAX_CONNECTIONS`,
/// `DB_MIN_CONNECTIONS`, and `DB_CONNECT_TIMEOUT_SECS`; anything unset
/// or unparseable keeps its default.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    /// Idle connections are reaped after this long.
    pub idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

impl PoolConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_connections: env_u32("DB_MAX_CONNECTIONS", defaults.max_connections),
            min_connections: env_u32("DB_MIN_CONNECTIONS", defaults.min_connections),
            connect_timeout: Duration::from_secs(env_u64(
                "DB_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout.as_secs(),
            )),
            idle_timeout: defaults.idle_timeout,
        }
    }

    pub fn max_connections(mut self, n: u32) -> Self {
        self.max_connections = n;
        self
    }

    pub fn min_connections(mut self, n: u32) -> Self {
        self.min_connections = n;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

fn env_u32(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Connect with default settings.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    create_pool_with_config(database_url, PoolConfig::default()).await
}

/// Connect with explicit settings.
pub async fn create_pool_with_config(database_url: &str, config: PoolConfig) -> Result<PgPool> {
    let start = Instant::now();

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.connect_timeout)
        .idle_timeout(config.idle_timeout)
        .connect(database_url)
        .await
        .map_err(Error::Database)?;

    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        pool_size = pool.size(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "database pool established"
    );
    Ok(pool)
}
