//! Tasklock Persistence - Lock table access
//!
//! This crate provides:
//! - The SeaORM entity for persisted lock rows
//! - `TimeDialect` strategies producing server-side "now + lease" expressions
//! - `LockStore`, the race-free try-acquire / reclaim / release primitives

pub mod dialect;
pub mod entity;
pub mod store;

// Re-export sea-orm for convenience
pub use sea_orm;

pub use dialect::{MySqlDialect, PostgresDialect, SqliteDialect, TimeDialect, dialect_for};
pub use store::{LeaseToken, LockStore};
