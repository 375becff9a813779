//! Database handle lifecycle
//!
//! A `DatabaseManager` owns the single process-wide connection pool. It is
//! created explicitly with [`DatabaseManager::connect`] and torn down with
//! [`DatabaseManager::close`]; nothing is initialised implicitly on first use.

use async_trait::async_trait;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tracing::info;

use crate::config::DatabaseConfig;

/// Source of database handles for plugin scopes
///
/// Implementations may hand out one shared pool or a dedicated database per
/// plugin. Failures are returned as-is and never cached by callers.
#[async_trait]
pub trait DatabaseProvider: Send + Sync {
    async fn connect(&self, plugin_id: &str) -> anyhow::Result<DatabaseConnection>;
}

/// Shared connection pool handed to every plugin scope
#[derive(Clone, Debug)]
pub struct DatabaseManager {
    db: DatabaseConnection,
}

impl DatabaseManager {
    /// Open the connection pool described by `config`
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DbErr> {
        let mut opt = ConnectOptions::new(config.url.clone());

        opt.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(config.connect_timeout())
            .acquire_timeout(config.acquire_timeout())
            .idle_timeout(config.idle_timeout())
            .max_lifetime(config.max_lifetime())
            .sqlx_logging(config.sqlx_logging);

        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            connect_timeout = config.connect_timeout_secs,
            idle_timeout = config.idle_timeout_secs,
            max_lifetime = config.max_lifetime_secs,
            sqlx_logging = config.sqlx_logging,
            "Database connection pool configured"
        );

        let db = Database::connect(opt).await?;
        Ok(Self { db })
    }

    /// Wrap an already established connection
    pub fn from_connection(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Close the pool; every clone handed out to plugins is closed with it
    pub async fn close(&self) -> Result<(), DbErr> {
        self.db.clone().close().await?;
        info!("Database connection pool closed");
        Ok(())
    }
}

#[async_trait]
impl DatabaseProvider for DatabaseManager {
    async fn connect(&self, _plugin_id: &str) -> anyhow::Result<DatabaseConnection> {
        Ok(self.db.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{ConnectionTrait, DbBackend};

    fn memory_config() -> DatabaseConfig {
        DatabaseConfig {
            max_connections: 1,
            ..DatabaseConfig::new("sqlite::memory:")
        }
    }

    #[tokio::test]
    async fn test_connect_and_share_pool() {
        let manager = DatabaseManager::connect(&memory_config()).await.unwrap();
        assert_eq!(manager.db().get_database_backend(), DbBackend::Sqlite);

        let a = manager.connect("plugin_a").await.unwrap();
        let b = manager.connect("plugin_b").await.unwrap();
        assert_eq!(a.get_database_backend(), b.get_database_backend());

        manager.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_rejects_bad_url() {
        let config = DatabaseConfig::new("nosuchdb://localhost/none");
        assert!(DatabaseManager::connect(&config).await.is_err());
    }
}
