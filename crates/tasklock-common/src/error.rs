//! Error types for tasklock
//!
//! Losing a race for a lock is not an error and never shows up here; it is
//! reported as a plain "not acquired" value by the lock APIs.

use sea_orm::sqlx::mysql::MySqlDatabaseError;
use sea_orm::{DbErr, RuntimeErr, SqlErr};

/// Errors surfaced by lock operations
#[derive(thiserror::Error, Debug)]
pub enum LockError {
    /// Malformed lock name or plugin scope, raised before any I/O
    #[error(
        "{0} is not a valid ID, expected string of lowercase characters and digits separated by underscores"
    )]
    InvalidId(String),

    #[error("database error: {0}")]
    Database(#[from] DbErr),

    /// The database handle for a scope could not be obtained
    #[error("connection error: {0}")]
    Connection(#[from] anyhow::Error),
}

impl LockError {
    /// Whether this error came from identifier validation
    pub fn is_invalid_id(&self) -> bool {
        matches!(self, LockError::InvalidId(_))
    }
}

/// Convenience result alias
pub type Result<T> = std::result::Result<T, LockError>;

/// Returns true when the database rejected a write because of a unique key
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// Returns true when the database aborted a statement to resolve a conflict
/// with a concurrent transaction
///
/// Covers MySQL deadlock victims (1213) and lock wait timeouts (1205),
/// PostgreSQL serialization failures (`40001`) and deadlocks (`40P01`), and a
/// busy or locked SQLite database. These mean another session was working on
/// the same row, not that the database is unhealthy.
pub fn is_transaction_conflict(err: &DbErr) -> bool {
    let (DbErr::Exec(RuntimeErr::SqlxError(e)) | DbErr::Query(RuntimeErr::SqlxError(e))) = err
    else {
        return false;
    };
    let Some(db_err) = e.as_database_error() else {
        return false;
    };

    if let Some(mysql) = db_err.try_downcast_ref::<MySqlDatabaseError>() {
        return matches!(mysql.number(), 1205 | 1213);
    }

    // SQLite reports its (extended) result code: BUSY, LOCKED and their variants
    matches!(
        db_err.code().as_deref(),
        Some("40001" | "40P01" | "5" | "6" | "262" | "517")
    )
}
