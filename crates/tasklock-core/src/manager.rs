//! Plugin-scoped task lock managers
//!
//! `TaskManager` maps each plugin id to its own namespace of lock names. The
//! lock store for a plugin is prepared lazily on first use and memoized: the
//! provider is asked for a connection (and the migration is applied) at most
//! once per plugin after success. A failed preparation is not remembered, so
//! the next call simply tries again.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use tasklock_common::{LockError, Result, validate_id};
use tasklock_migration::{Migrator, MigratorTrait};
use tasklock_persistence::LockStore;

use crate::config::DatabaseConfig;
use crate::database::{DatabaseManager, DatabaseProvider};
use crate::lock::{AcquireLockOptions, LockAcquisition, LockHandle};

type StoreCell = Arc<OnceCell<LockStore>>;

/// Entry point handing out per-plugin lock managers
pub struct TaskManager {
    provider: Arc<dyn DatabaseProvider>,
    scopes: DashMap<String, StoreCell>,
    run_migrations: bool,
}

impl TaskManager {
    /// Create a manager drawing connections from `provider`
    pub fn new(provider: Arc<dyn DatabaseProvider>) -> Self {
        Self {
            provider,
            scopes: DashMap::new(),
            run_migrations: true,
        }
    }

    /// Open a pool from `config` and build a manager on top of it
    pub async fn from_config(config: &DatabaseConfig) -> Result<Self> {
        let database = DatabaseManager::connect(config).await?;
        Ok(Self::new(Arc::new(database)).with_migrations(config.run_migrations))
    }

    /// Whether the lock table migration runs when a plugin scope is prepared
    pub fn with_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Lock manager for one plugin's namespace
    ///
    /// Repeated calls with the same id share one lazily prepared store.
    pub fn for_plugin(&self, plugin_id: &str) -> Result<PluginTaskManager> {
        validate_id(plugin_id)?;

        let cell = self
            .scopes
            .entry(plugin_id.to_string())
            .or_default()
            .value()
            .clone();

        Ok(PluginTaskManager {
            plugin_id: plugin_id.to_string(),
            cell,
            provider: self.provider.clone(),
            run_migrations: self.run_migrations,
        })
    }
}

/// Lock operations confined to one plugin's namespace
#[derive(Clone)]
pub struct PluginTaskManager {
    plugin_id: String,
    cell: StoreCell,
    provider: Arc<dyn DatabaseProvider>,
    run_migrations: bool,
}

impl PluginTaskManager {
    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    async fn store(&self) -> Result<&LockStore> {
        self.cell
            .get_or_try_init(|| async {
                let db = self.provider.connect(&self.plugin_id).await.map_err(|e| {
                    warn!(plugin = %self.plugin_id, error = %e, "Failed to obtain database for plugin");
                    LockError::Connection(e)
                })?;

                if self.run_migrations {
                    Migrator::up(&db, None).await?;
                }

                info!(plugin = %self.plugin_id, "Task lock store ready");
                Ok::<_, LockError>(LockStore::new(db))
            })
            .await
    }

    /// Try once to take the lock `id` for this plugin
    ///
    /// Never waits for a current holder. Returns `NotAcquired` while another
    /// live lease holds the name; an expired lease is reclaimed on the spot.
    pub async fn acquire_lock(
        &self,
        id: &str,
        options: AcquireLockOptions,
    ) -> Result<LockAcquisition> {
        validate_id(id)?;

        let store = self.store().await?;
        let outcome = match store.try_acquire(&self.plugin_id, id, options.lease).await? {
            Some(token) => LockAcquisition::Acquired(LockHandle::new(
                store.clone(),
                &self.plugin_id,
                id,
                token,
            )),
            None => LockAcquisition::NotAcquired,
        };

        debug!(
            plugin = %self.plugin_id,
            name = %id,
            acquired = outcome.acquired(),
            "Lock attempt finished"
        );
        Ok(outcome)
    }
}
