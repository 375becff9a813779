//! Identifier validation
//!
//! Lock names and plugin scopes share one grammar: lowercase letters and digits
//! in segments separated by single underscores. This keeps them usable as
//! Prometheus-style label values.

use std::sync::LazyLock;

use crate::error::LockError;

static ID_PATTERN: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new("^[a-z0-9]+(?:_[a-z0-9]+)*$").expect("Invalid regex pattern")
});

/// Check an identifier against the lock name grammar
///
/// # Examples
///
/// ```
/// use tasklock_common::is_valid_id;
///
/// assert!(is_valid_id("lock_1"));
/// assert!(!is_valid_id("lock__1"));
/// assert!(!is_valid_id("Lock1"));
/// ```
pub fn is_valid_id(id: &str) -> bool {
    ID_PATTERN.is_match(id)
}

/// Validate an identifier, failing with `LockError::InvalidId` when malformed
pub fn validate_id(id: &str) -> Result<(), LockError> {
    if is_valid_id(id) {
        Ok(())
    } else {
        Err(LockError::InvalidId(id.to_string()))
    }
}
