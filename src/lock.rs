//! Idle/Locked phase flag guarding the estimator lifecycle.
//!
//! `estimate()` acquires the flag through a scoped guard, so the Idle
//! phase is restored on every exit path, including panics unwinding out
//! of listener callbacks. The flag is a cheap cloneable handle and stays
//! coherent across threads for the whole run.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared two-state phase flag: unset = Idle, set = Locked.
#[derive(Debug, Clone, Default)]
pub struct LockFlag {
    locked: Arc<AtomicBool>,
}

impl LockFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an estimation is currently running.
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }

    /// Flip Idle -> Locked. Returns `None` when already locked, which is
    /// how reentrant `estimate()` calls are rejected.
    pub fn acquire(&self) -> Option<LockGuard> {
        if self.locked.swap(true, Ordering::SeqCst) {
            None
        } else {
            Some(LockGuard {
                flag: Arc::clone(&self.locked),
            })
        }
    }
}

/// Scoped guard holding the Locked phase; dropping it restores Idle.
#[derive(Debug)]
pub struct LockGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
