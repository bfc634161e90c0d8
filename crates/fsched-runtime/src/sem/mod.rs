//! Counting semaphore for the idle barrier
//!
//! One process-wide instance parks workers that reached their `SAC` before
//! the rest. Platform-specific implementations use the most efficient
//! primitive available.

/// Counting semaphore.
///
/// The permit count equals the number of workers the next barrier release
/// will wake; `acquire` blocks until a permit is available and consumes it.
pub trait Semaphore: Send + Sync {
    /// Block until a permit is available, then consume it
    fn acquire(&self);

    /// Add `permits` permits, waking up to that many blocked acquirers
    fn release(&self, permits: usize);

    /// Current permit count (hint, may be stale)
    fn permits(&self) -> usize;
}

// Platform-specific implementations
cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        mod futex_linux;
        pub use futex_linux::FutexSemaphore as PlatformSemaphore;
    } else {
        mod fallback;
        pub use fallback::CondvarSemaphore as PlatformSemaphore;
    }
}

/// Create a new platform-appropriate semaphore with zero permits
pub fn new_semaphore() -> Box<dyn Semaphore> {
    Box::new(PlatformSemaphore::new())
}
