//! Common test utilities for database integration testing

#[allow(dead_code, unused_imports)]
pub mod db;

#[allow(unused_imports)]
pub use db::{TestDatabase, TestDatabaseConfig};
