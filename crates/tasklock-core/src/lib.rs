//! Tasklock Core - Leased locks shared through one relational database
//!
//! Independent processes pointed at the same database use this crate to make
//! sure only one of them works on a named task at a time. Locks are leased:
//! a holder that crashes without releasing stops blocking others once its
//! lease runs out.
//!
//! ```no_run
//! use std::time::Duration;
//! use tasklock_core::{AcquireLockOptions, DatabaseConfig, LockAcquisition, TaskManager};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let config = DatabaseConfig::new("postgres://localhost/app");
//! let manager = TaskManager::from_config(&config).await?;
//! let tasks = manager.for_plugin("catalog")?;
//!
//! if let LockAcquisition::Acquired(lock) = tasks
//!     .acquire_lock("refresh", AcquireLockOptions::lease(Duration::from_secs(30)))
//!     .await?
//! {
//!     // ... do the work ...
//!     lock.release().await?;
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod database;
pub mod lock;
pub mod manager;

pub use config::DatabaseConfig;
pub use database::{DatabaseManager, DatabaseProvider};
pub use lock::{AcquireLockOptions, LockAcquisition, LockHandle};
pub use manager::{PluginTaskManager, TaskManager};

pub use tasklock_common::{LockError, Result};
