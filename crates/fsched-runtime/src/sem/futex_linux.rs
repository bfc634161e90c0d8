//! Linux futex-based counting semaphore
//!
//! The futex word is the permit count. `release` adds permits and wakes
//! waiters; `acquire` consumes a permit or sleeps while the word is zero.

use super::Semaphore;
use std::sync::atomic::{AtomicU32, Ordering};

/// Linux futex-backed semaphore
pub struct FutexSemaphore {
    /// Futex word: available permits
    permits: AtomicU32,
}

impl FutexSemaphore {
    /// Create a semaphore with zero permits
    pub fn new() -> Self {
        Self {
            permits: AtomicU32::new(0),
        }
    }

    fn futex_wait(&self, expected: u32) {
        unsafe {
            libc::syscall(
                libc::SYS_futex,
                self.permits.as_ptr(),
                libc::FUTEX_WAIT | libc::FUTEX_PRIVATE_FLAG,
                expected,
                std::ptr::null::<libc::timespec>(),
                std::ptr::null::<u32>(),
                0u32,
            );
        }
    }

    fn futex_wake(&self, n: i32) {
        unsafe {
            libc::syscall(
                libc::SYS_futex,
                self.permits.as_ptr(),
                libc::FUTEX_WAKE | libc::FUTEX_PRIVATE_FLAG,
                n,
                std::ptr::null::<libc::timespec>(),
                std::ptr::null::<u32>(),
                0u32,
            );
        }
    }
}

impl Default for FutexSemaphore {
    fn default() -> Self {
        Self::new()
    }
}

impl Semaphore for FutexSemaphore {
    fn acquire(&self) {
        loop {
            let current = self.permits.load(Ordering::Acquire);
            if current > 0 {
                // Try to consume a permit
                if self
                    .permits
                    .compare_exchange_weak(
                        current,
                        current - 1,
                        Ordering::AcqRel,
                        Ordering::Acquire,
                    )
                    .is_ok()
                {
                    return;
                }
                // CAS failed, retry
                continue;
            }
            // No permits: sleep while the word is still zero. A wake between
            // the load and the wait shows up as EAGAIN and we just retry.
            self.futex_wait(0);
        }
    }

    fn release(&self, permits: usize) {
        if permits == 0 {
            return;
        }
        self.permits.fetch_add(permits as u32, Ordering::Release);
        self.futex_wake(permits.min(i32::MAX as usize) as i32);
    }

    fn permits(&self) -> usize {
        self.permits.load(Ordering::Relaxed) as usize
    }
}

// Safety: FutexSemaphore only contains atomics
unsafe impl Send for FutexSemaphore {}
unsafe impl Sync for FutexSemaphore {}
