//! Tasklock command line front end
//!
//! Wraps a command in a database-backed lease lock so that, across every host
//! sharing the database, at most one copy runs at a time.

pub mod command;
pub mod config;
pub mod logging;

pub use command::{Cli, Command, execute};
pub use config::AppConfig;
