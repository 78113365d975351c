//! Helpers shared by in-crate test modules.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Serializes tests that read or mutate process environment variables.
pub(crate) fn env_lock() -> MutexGuard<'static, ()> {
    static LOCK: Mutex<()> = Mutex::new(());
    LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}
