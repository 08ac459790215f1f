//! The metadata lock.
//!
//! All construction of runtime metadata is serialized by a single process-wide lock that
//! is shared between the generic method cache and the rest of the metadata subsystem.
//! The lock is re-acquirable by the thread that holds it: constructing a method may
//! inflate a signature that requests another (or the same) generic method, and that
//! nested request must be able to reach the pending-set check.

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

/// Guard of a held [`MetadataLock`]
pub type MetadataGuard<'a> = ReentrantMutexGuard<'a, ()>;

/// Process-wide lock serializing metadata construction
#[derive(Default)]
pub struct MetadataLock {
    inner: ReentrantMutex<()>,
}

impl MetadataLock {
    /// Create an unlocked lock
    pub fn new() -> Self {
        MetadataLock {
            inner: ReentrantMutex::new(()),
        }
    }

    /// Acquire the lock, blocking while another thread holds it
    pub fn lock(&self) -> MetadataGuard<'_> {
        self.inner.lock()
    }

    /// Returns `true` if any thread holds the lock
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }

    /// Returns `true` if the calling thread holds the lock
    pub fn is_held_by_current_thread(&self) -> bool {
        self.inner.is_owned_by_current_thread()
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::*;

    #[test]
    fn test_reentrant_on_same_thread() {
        let lock = MetadataLock::new();
        let outer = lock.lock();
        let inner = lock.lock();

        assert!(lock.is_held_by_current_thread());
        drop(inner);
        assert!(lock.is_locked());
        drop(outer);
        assert!(!lock.is_locked());
    }

    #[test]
    fn test_exclusive_across_threads() {
        let lock = Arc::new(MetadataLock::new());
        let guard = lock.lock();

        let other = Arc::clone(&lock);
        let observed = thread::spawn(move || {
            (other.is_locked(), other.is_held_by_current_thread())
        })
        .join()
        .unwrap();

        assert_eq!(observed, (true, false));
        drop(guard);
    }
}
