//! Spinlock backing the global scheduler lock
//!
//! `ADV` and `INC` run O(1) critical sections under one process-wide
//! lock, and the lock is never held across a reaction invocation or a
//! blocking instruction. Under those constraints a spinlock with a short
//! backoff beats a full OS mutex.

use core::cell::UnsafeCell;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, Ordering};

/// Spinlock for short scheduler critical sections.
pub struct SpinLock<T> {
    held: AtomicBool,
    value: UnsafeCell<T>,
}

// Safety: the lock serializes all access to the inner value
unsafe impl<T: Send> Send for SpinLock<T> {}
unsafe impl<T: Send> Sync for SpinLock<T> {}

impl<T> SpinLock<T> {
    #[inline]
    pub const fn new(value: T) -> Self {
        SpinLock {
            held: AtomicBool::new(false),
            value: UnsafeCell::new(value),
        }
    }

    /// Acquire the lock, spinning with a growing pause window while it is
    /// contended.
    #[inline]
    pub fn lock(&self) -> SpinLockGuard<'_, T> {
        let mut pause = 1u32;
        loop {
            if !self.held.swap(true, Ordering::Acquire) {
                return SpinLockGuard { lock: self };
            }
            // Read-only spin until the holder looks gone, then race again
            while self.held.load(Ordering::Relaxed) {
                for _ in 0..pause {
                    core::hint::spin_loop();
                }
                pause = (pause * 2).min(64);
            }
        }
    }

    /// Acquire only if the lock is free right now
    #[inline]
    pub fn try_lock(&self) -> Option<SpinLockGuard<'_, T>> {
        if self.held.swap(true, Ordering::Acquire) {
            None
        } else {
            Some(SpinLockGuard { lock: self })
        }
    }

    /// Whether some thread currently holds the lock (racy, for tests)
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.held.load(Ordering::Relaxed)
    }
}

/// RAII guard; the lock is released on drop
pub struct SpinLockGuard<'a, T> {
    lock: &'a SpinLock<T>,
}

impl<T> Deref for SpinLockGuard<'_, T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        // Safety: the guard proves the lock is held
        unsafe { &*self.lock.value.get() }
    }
}

impl<T> DerefMut for SpinLockGuard<'_, T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        // Safety: the guard proves the lock is held
        unsafe { &mut *self.lock.value.get() }
    }
}

impl<T> Drop for SpinLockGuard<'_, T> {
    #[inline]
    fn drop(&mut self) {
        self.lock.held.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_guard_gives_exclusive_access() {
        let lock = SpinLock::new(7u64);
        *lock.lock() += 1;
        assert_eq!(*lock.lock(), 8);
    }

    #[test]
    fn test_try_lock_fails_while_held() {
        let lock = SpinLock::new(());
        let guard = lock.lock();
        assert!(lock.is_locked());
        assert!(lock.try_lock().is_none());
        drop(guard);
        assert!(lock.try_lock().is_some());
    }

    #[test]
    fn test_contended_increments_do_not_tear() {
        let lock = Arc::new(SpinLock::new(0u64));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let lock = Arc::clone(&lock);
                thread::spawn(move || {
                    for _ in 0..2500 {
                        *lock.lock() += 1;
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(*lock.lock(), 10_000);
    }
}
