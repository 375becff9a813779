//! Tasklock Common - Shared types and utilities
//!
//! This crate provides the foundational pieces used across all tasklock components:
//! - The `LockError` taxonomy
//! - Identifier validation for lock names and plugin scopes
//! - Common constants

pub mod error;
pub mod utils;

// Re-exports for convenience
pub use error::{LockError, Result};
pub use utils::{is_valid_id, validate_id};

/// Default lease granted when a caller does not pick one
pub const DEFAULT_LEASE_SECONDS: u64 = 60;
