//! Fallback counting semaphore using std::sync::Condvar
//!
//! Used on platforms without futex support. Less efficient but portable.

use super::Semaphore;
use std::sync::{Condvar, Mutex};

/// Condvar-based semaphore (fallback)
pub struct CondvarSemaphore {
    permits: Mutex<usize>,
    condvar: Condvar,
}

impl CondvarSemaphore {
    /// Create a semaphore with zero permits
    pub fn new() -> Self {
        Self {
            permits: Mutex::new(0),
            condvar: Condvar::new(),
        }
    }
}

impl Default for CondvarSemaphore {
    fn default() -> Self {
        Self::new()
    }
}

impl Semaphore for CondvarSemaphore {
    fn acquire(&self) {
        let mut permits = self.permits.lock().unwrap();
        while *permits == 0 {
            permits = self.condvar.wait(permits).unwrap();
        }
        *permits -= 1;
    }

    fn release(&self, permits: usize) {
        if permits == 0 {
            return;
        }
        {
            let mut guard = self.permits.lock().unwrap();
            *guard += permits;
        }
        self.condvar.notify_all();
    }

    fn permits(&self) -> usize {
        *self.permits.lock().unwrap()
    }
}
