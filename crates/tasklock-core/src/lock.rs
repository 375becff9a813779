//! Lock handles and acquisition results

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::debug;

use tasklock_common::{DEFAULT_LEASE_SECONDS, Result};
use tasklock_persistence::{LeaseToken, LockStore};

/// Options for a single lock attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AcquireLockOptions {
    /// How long the winner owns the lock if it never releases it.
    /// This is not a wait timeout; attempts never block.
    pub lease: Duration,
}

impl AcquireLockOptions {
    pub fn lease(lease: Duration) -> Self {
        Self { lease }
    }
}

impl Default for AcquireLockOptions {
    fn default() -> Self {
        Self::lease(Duration::from_secs(DEFAULT_LEASE_SECONDS))
    }
}

/// Outcome of one lock attempt
///
/// Losing to another holder is an ordinary value, not an error. Only the
/// `Acquired` variant carries a handle, so there is nothing to release after
/// a failed attempt.
#[derive(Debug)]
#[must_use = "an acquired lock stays held until released or its lease expires"]
pub enum LockAcquisition {
    Acquired(LockHandle),
    NotAcquired,
}

impl LockAcquisition {
    pub fn acquired(&self) -> bool {
        matches!(self, LockAcquisition::Acquired(_))
    }

    pub fn into_handle(self) -> Option<LockHandle> {
        match self {
            LockAcquisition::Acquired(handle) => Some(handle),
            LockAcquisition::NotAcquired => None,
        }
    }
}

/// Ownership of one named lock within a plugin scope
///
/// Dropping the handle does not release the lock; the row stays until
/// [`LockHandle::release`] is called or the lease runs out.
#[derive(Debug)]
pub struct LockHandle {
    store: LockStore,
    plugin_id: String,
    name: String,
    token: LeaseToken,
    released: AtomicBool,
}

impl LockHandle {
    pub(crate) fn new(store: LockStore, plugin_id: &str, name: &str, token: LeaseToken) -> Self {
        Self {
            store,
            plugin_id: plugin_id.to_string(),
            name: name.to_string(),
            token,
            released: AtomicBool::new(false),
        }
    }

    /// Always true; a handle only exists for a won attempt
    pub fn acquired(&self) -> bool {
        true
    }

    pub fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn token(&self) -> &LeaseToken {
        &self.token
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Give the lock back
    ///
    /// Idempotent: later calls are no-ops. If the lease already expired and
    /// another owner reclaimed the name, their row is left untouched. A failed
    /// delete leaves the handle unreleased so the call can be retried.
    pub async fn release(&self) -> Result<()> {
        if self.released.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        match self
            .store
            .release(&self.plugin_id, &self.name, &self.token)
            .await
        {
            Ok(removed) => {
                if !removed {
                    debug!(
                        plugin = %self.plugin_id,
                        name = %self.name,
                        "Lock already expired or reclaimed before release"
                    );
                }
                Ok(())
            }
            Err(e) => {
                self.released.store(false, Ordering::Release);
                Err(e)
            }
        }
    }
}
