//! Layered application configuration
//!
//! Sources, lowest precedence first: built-in defaults, the YAML config file,
//! `TASKLOCK_*` environment variables, then command line overrides.

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use tasklock_common::DEFAULT_LEASE_SECONDS;
use tasklock_core::DatabaseConfig;

use crate::logging::LoggingConfig;

/// Config file looked up when `--config` is not given (extension optional)
pub const DEFAULT_CONFIG_FILE: &str = "conf/tasklock";

/// Lock defaults
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    pub default_lease_secs: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            default_lease_secs: DEFAULT_LEASE_SECONDS,
        }
    }
}

/// Application configuration loaded from config files and environment
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub lock: LockConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration; an explicit `path` must exist, the default file may not
    pub fn load(path: Option<&Path>, database_url: Option<String>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => File::from(PathBuf::from(p)).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let mut builder = Config::builder().add_source(file).add_source(
            Environment::with_prefix("TASKLOCK")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(url) = database_url {
            builder = builder.set_override("database.url", url)?;
        }

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_from_file_with_override() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(
            file,
            "database:\n  url: \"postgres://db/app\"\n  max_connections: 4\nlock:\n  default_lease_secs: 15\nlogging:\n  level: debug"
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path()), None).unwrap();
        assert_eq!(config.database.url, "postgres://db/app");
        assert_eq!(config.database.max_connections, 4);
        assert_eq!(config.database.min_connections, 1);
        assert_eq!(config.lock.default_lease_secs, 15);
        assert_eq!(config.logging.level, "debug");

        let overridden =
            AppConfig::load(Some(file.path()), Some("mysql://db/other".to_string())).unwrap();
        assert_eq!(overridden.database.url, "mysql://db/other");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yml");
        assert!(AppConfig::load(Some(&path), None).is_err());
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.lock.default_lease_secs, DEFAULT_LEASE_SECONDS);
        assert!(config.database.run_migrations);
        assert!(config.logging.console);
        assert!(config.logging.dir.is_none());
    }
}
