//! Command line definitions and execution

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tasklock_common::validate_id;
use tasklock_core::{
    AcquireLockOptions, DatabaseManager, LockAcquisition, PluginTaskManager, TaskManager,
};
use tasklock_migration::{Migrator, MigratorTrait};
use tracing::{info, warn};

use crate::config::AppConfig;

/// Exit code for malformed arguments such as invalid lock ids (`EX_USAGE`)
pub const EXIT_USAGE: u8 = 64;
/// Exit code when the lock is held elsewhere (`EX_TEMPFAIL`)
pub const EXIT_LOCK_HELD: u8 = 75;

#[derive(Debug, Parser)]
#[command(name = "tasklock", version, about = "Run tasks under database-backed lease locks")]
pub struct Cli {
    /// Configuration file (defaults to conf/tasklock.yml when present)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    #[arg(long = "db-url", env = "DATABASE_URL", global = true)]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the lock table if it does not exist
    Migrate,
    /// Run a command while holding a lock; exit 75 if someone else holds it
    Run {
        /// Plugin scope the lock name belongs to
        #[arg(short = 'p', long = "plugin")]
        plugin: String,
        /// Lock name
        #[arg(short = 'n', long = "name")]
        name: String,
        /// Lease in seconds (defaults to lock.default_lease_secs)
        #[arg(short = 'l', long = "lease")]
        lease: Option<u64>,
        /// Command and arguments to run
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },
}

/// Run the parsed command against the configured database
pub async fn execute(command: Command, config: &AppConfig) -> anyhow::Result<u8> {
    // Malformed ids are a usage error and never wait on the database
    if let Command::Run { plugin, name, .. } = &command
        && let Err(e) = validate_id(plugin).and_then(|()| validate_id(name))
    {
        eprintln!("{}", e);
        return Ok(EXIT_USAGE);
    }

    let database = Arc::new(DatabaseManager::connect(&config.database).await?);

    let result = match command {
        Command::Migrate => {
            Migrator::up(database.db(), None).await?;
            info!("Lock table migration applied");
            Ok(0)
        }
        Command::Run {
            plugin,
            name,
            lease,
            command,
        } => {
            let manager = TaskManager::new(database.clone())
                .with_migrations(config.database.run_migrations);
            let lease =
                Duration::from_secs(lease.unwrap_or(config.lock.default_lease_secs));

            match manager.for_plugin(&plugin) {
                Ok(tasks) => run_locked(&tasks, &name, lease, &command).await,
                Err(e) => Err(e.into()),
            }
        }
    };

    database.close().await?;
    result
}

/// Acquire `name`, run `command` to completion, then release
///
/// Returns the child's exit code, or [`EXIT_LOCK_HELD`] without running
/// anything when the lock is taken.
pub async fn run_locked(
    tasks: &PluginTaskManager,
    name: &str,
    lease: Duration,
    command: &[String],
) -> anyhow::Result<u8> {
    let Some((program, args)) = command.split_first() else {
        anyhow::bail!("no command given");
    };

    let lock = match tasks
        .acquire_lock(name, AcquireLockOptions::lease(lease))
        .await?
    {
        LockAcquisition::Acquired(lock) => lock,
        LockAcquisition::NotAcquired => {
            warn!(plugin = %tasks.plugin_id(), name = %name, "Lock is held elsewhere, skipping");
            return Ok(EXIT_LOCK_HELD);
        }
    };

    info!(
        plugin = %tasks.plugin_id(),
        name = %name,
        lease_secs = lease.as_secs(),
        program = %program,
        "Lock acquired, running command"
    );

    let status = tokio::process::Command::new(program)
        .args(args)
        .status()
        .await;

    lock.release().await?;

    let status = status?;
    let code = status.code().map(|c| c.clamp(0, 255) as u8).unwrap_or(1);
    info!(name = %name, exit_code = code, "Command finished, lock released");
    Ok(code)
}
