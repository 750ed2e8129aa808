// src/db/connection.rs
//
// Database connection management
//
// PRINCIPLES:
// - Explicit connection pooling
// - Every connection enforces foreign keys (cascades depend on it)
// - Clear error propagation

use log::info;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::path::PathBuf;

use crate::error::{AppError, AppResult};

/// Type alias for connection pool
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Type alias for a pooled connection
pub type PooledConn = PooledConnection<SqliteConnectionManager>;

const ENV_DB_PATH: &str = "SCOUTHUB_DB_PATH";
const ENV_POOL_SIZE: &str = "SCOUTHUB_DB_POOL_SIZE";
const ENV_BUSY_TIMEOUT: &str = "SCOUTHUB_DB_BUSY_TIMEOUT_MS";

/// Where the database lives and how the pool is sized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
    /// How long a writer waits on a locked database before failing
    pub busy_timeout_ms: u32,
}

impl DatabaseConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Default configuration overridden by `SCOUTHUB_DB_*` environment variables
    pub fn from_env() -> AppResult<Self> {
        let mut config = Self::default();

        if let Ok(path) = std::env::var(ENV_DB_PATH) {
            config.path = PathBuf::from(path);
        }
        if let Ok(size) = std::env::var(ENV_POOL_SIZE) {
            config.max_connections = size
                .parse()
                .map_err(|e| AppError::Other(format!("Invalid {}: {}", ENV_POOL_SIZE, e)))?;
        }
        if let Ok(timeout) = std::env::var(ENV_BUSY_TIMEOUT) {
            config.busy_timeout_ms = timeout
                .parse()
                .map_err(|e| AppError::Other(format!("Invalid {}: {}", ENV_BUSY_TIMEOUT, e)))?;
        }

        Ok(config)
    }
}

impl Default for DatabaseConfig {
    /// `{APP_DATA}/scouthub/scouthub.db`, falling back to the working directory
    fn default() -> Self {
        let dir = dirs::data_dir()
            .map(|d| d.join("scouthub"))
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            path: dir.join("scouthub.db"),
            max_connections: 15,
            busy_timeout_ms: 5000,
        }
    }
}

/// Create a connection pool
///
/// - SQLite in WAL mode for concurrent readers
/// - Foreign keys enabled on every connection
/// - Busy timeout so concurrent writers queue instead of failing immediately
pub fn create_connection_pool(config: &DatabaseConfig) -> AppResult<ConnectionPool> {
    if let Some(parent) = config.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let pragmas = format!(
        "PRAGMA busy_timeout = {};
         PRAGMA foreign_keys = ON;
         PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
        config.busy_timeout_ms
    );

    let manager = SqliteConnectionManager::file(&config.path)
        .with_init(move |conn| conn.execute_batch(&pragmas));

    let pool = Pool::builder()
        .max_size(config.max_connections)
        .build(manager)
        .map_err(|e| AppError::Pool(format!("Failed to create connection pool: {}", e)))?;

    info!(
        "Opened database {} (pool size {})",
        config.path.display(),
        config.max_connections
    );

    Ok(pool)
}

/// Get a connection from the pool
pub fn get_connection(pool: &ConnectionPool) -> AppResult<PooledConn> {
    pool.get()
        .map_err(|e| AppError::Pool(format!("Failed to get database connection: {}", e)))
}

/// Create a standalone in-memory connection (for testing)
pub fn create_test_connection() -> AppResult<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path_ends_with_database_file() {
        let config = DatabaseConfig::default();
        assert!(config.path.ends_with("scouthub/scouthub.db"));
        assert_eq!(config.max_connections, 15);
    }

    // Only test that touches SCOUTHUB_DB_* variables
    #[test]
    fn test_from_env_overrides_and_rejects_invalid_values() {
        std::env::set_var(ENV_DB_PATH, "/tmp/scouthub-env/custom.db");
        std::env::set_var(ENV_POOL_SIZE, "4");
        std::env::set_var(ENV_BUSY_TIMEOUT, "250");

        let config = DatabaseConfig::from_env().unwrap();
        assert_eq!(config.path, PathBuf::from("/tmp/scouthub-env/custom.db"));
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.busy_timeout_ms, 250);

        std::env::set_var(ENV_POOL_SIZE, "many");
        assert!(matches!(DatabaseConfig::from_env(), Err(AppError::Other(_))));

        std::env::set_var(ENV_POOL_SIZE, "4");
        std::env::set_var(ENV_BUSY_TIMEOUT, "-1");
        assert!(matches!(DatabaseConfig::from_env(), Err(AppError::Other(_))));

        std::env::remove_var(ENV_DB_PATH);
        std::env::remove_var(ENV_POOL_SIZE);
        std::env::remove_var(ENV_BUSY_TIMEOUT);

        assert_eq!(DatabaseConfig::from_env().unwrap(), DatabaseConfig::default());
    }

    #[test]
    fn test_connection_pool_creation() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig::new(dir.path().join("nested").join("test.db"));

        let pool = create_connection_pool(&config).unwrap();
        let conn = get_connection(&pool).unwrap();

        let fk_enabled: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk_enabled, 1);
        assert!(config.path.exists());
    }

    #[test]
    fn test_test_connection() {
        let conn = create_test_connection().unwrap();

        let result: i32 = conn
            .query_row("SELECT 1 + 1", [], |row| row.get(0))
            .unwrap();
        assert_eq!(result, 2);

        let fk_enabled: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk_enabled, 1);
    }
}
