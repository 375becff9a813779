//! Database test utilities
//!
//! Provides connections to MySQL or PostgreSQL for cross-dialect lock tests.
//! Tests are skipped unless `TEST_DATABASE_URL` points at a database.

use std::env;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use tasklock_migration::{Migrator, MigratorTrait};

/// Configuration for test database
#[derive(Clone, Debug)]
pub struct TestDatabaseConfig {
    /// Database URL
    pub url: String,
    /// Whether to apply the lock table migration
    pub run_migrations: bool,
}

impl TestDatabaseConfig {
    /// Create config from environment variable
    pub fn from_env() -> Option<Self> {
        env::var("TEST_DATABASE_URL").ok().map(|url| Self {
            url,
            run_migrations: true,
        })
    }

    /// Create MySQL config
    pub fn mysql(host: &str, port: u16, database: &str, user: &str, password: &str) -> Self {
        Self {
            url: format!(
                "mysql://{}:{}@{}:{}/{}",
                user, password, host, port, database
            ),
            run_migrations: true,
        }
    }

    /// Create PostgreSQL config
    pub fn postgres(host: &str, port: u16, database: &str, user: &str, password: &str) -> Self {
        Self {
            url: format!(
                "postgres://{}:{}@{}:{}/{}",
                user, password, host, port, database
            ),
            run_migrations: true,
        }
    }
}

/// Test database wrapper
pub struct TestDatabase {
    /// Database connection
    pub connection: DatabaseConnection,
    config: TestDatabaseConfig,
}

impl TestDatabase {
    /// Connect to test database
    pub async fn connect(config: TestDatabaseConfig) -> Result<Self, TestDatabaseError> {
        let mut opt = ConnectOptions::new(config.url.clone());
        opt.max_connections(16).sqlx_logging(false);

        let connection = Database::connect(opt)
            .await
            .map_err(|e| TestDatabaseError::ConnectionFailed(e.to_string()))?;

        let db = Self { connection, config };

        if db.config.run_migrations {
            Migrator::up(&db.connection, None)
                .await
                .map_err(|e| TestDatabaseError::MigrationFailed(e.to_string()))?;
        }

        Ok(db)
    }

    /// Connect using environment variable, `None` when it is not set
    pub async fn from_env() -> Option<Self> {
        let config = TestDatabaseConfig::from_env()?;
        Some(
            Self::connect(config)
                .await
                .expect("TEST_DATABASE_URL set but database unreachable"),
        )
    }

    /// Get database connection
    pub fn conn(&self) -> &DatabaseConnection {
        &self.connection
    }

    /// Check if using MySQL
    pub fn is_mysql(&self) -> bool {
        self.config.url.starts_with("mysql://")
    }

    /// Check if using PostgreSQL
    pub fn is_postgres(&self) -> bool {
        self.config.url.starts_with("postgres://")
    }

    /// Remove every lock row held under `scope`
    pub async fn clear_scope(&self, scope: &str) -> Result<(), TestDatabaseError> {
        let backend = self.connection.get_database_backend();
        let sql = if self.is_postgres() {
            "DELETE FROM tasklock_locks WHERE scope = $1"
        } else {
            "DELETE FROM tasklock_locks WHERE scope = ?"
        };
        self.connection
            .execute(Statement::from_sql_and_values(backend, sql, [scope.into()]))
            .await?;
        Ok(())
    }
}

/// Errors that can occur when managing test database
#[derive(Debug)]
pub enum TestDatabaseError {
    /// Connection failed
    ConnectionFailed(String),
    /// Migration failed
    MigrationFailed(String),
    /// Query execution failed
    QueryFailed(String),
}

impl std::fmt::Display for TestDatabaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionFailed(e) => write!(f, "Database connection failed: {}", e),
            Self::MigrationFailed(e) => write!(f, "Migration failed: {}", e),
            Self::QueryFailed(e) => write!(f, "Query failed: {}", e),
        }
    }
}

impl std::error::Error for TestDatabaseError {}

impl From<DbErr> for TestDatabaseError {
    fn from(err: DbErr) -> Self {
        TestDatabaseError::QueryFailed(err.to_string())
    }
}

/// Skip the calling test when no database is configured
#[macro_export]
macro_rules! require_db {
    () => {
        match $crate::common::TestDatabase::from_env().await {
            Some(db) => db,
            None => {
                eprintln!("Skipping test: TEST_DATABASE_URL not set");
                return;
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_mysql() {
        let config = TestDatabaseConfig::mysql("localhost", 3306, "test", "user", "pass");
        assert!(config.url.starts_with("mysql://"));
        assert!(config.url.contains("localhost:3306"));
    }

    #[test]
    fn test_config_postgres() {
        let config = TestDatabaseConfig::postgres("localhost", 5432, "test", "user", "pass");
        assert!(config.url.starts_with("postgres://"));
        assert!(config.url.contains("localhost:5432"));
    }
}
