//! Idle barrier
//!
//! The `SAC` instruction parks every worker until the whole fleet has gone
//! idle; the last worker to arrive runs a reset step (clearing the
//! counters of the finished hyperperiod) and releases the others. The
//! releaser itself never waits, so it posts one permit fewer than the
//! number of idle workers.

use crate::sem::{new_semaphore, Semaphore};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Barrier tracking the number of idle workers.
pub struct IdleBarrier {
    /// Workers currently idle at their `SAC`
    n_idle: AtomicUsize,

    /// Fleet size (constant after init)
    n_workers: usize,

    /// Parked workers wait here; permits are posted by the releaser
    sem: Box<dyn Semaphore>,
}

impl IdleBarrier {
    pub fn new(n_workers: usize) -> Self {
        Self {
            n_idle: AtomicUsize::new(0),
            n_workers,
            sem: new_semaphore(),
        }
    }

    /// Register the calling worker as idle.
    ///
    /// Returns true iff it was the last one, i.e. the caller must run the
    /// reset step and then [`IdleBarrier::release_peers`].
    #[inline]
    pub fn arrive(&self) -> bool {
        self.n_idle.fetch_add(1, Ordering::AcqRel) + 1 == self.n_workers
    }

    /// Wake every parked worker.
    ///
    /// Only called by the releaser while all workers are idle, so the
    /// `n_idle` read needs no lock: nobody else is touching it.
    pub fn release_peers(&self) {
        let workers_to_awaken = self.n_idle.load(Ordering::Acquire);
        fsched_core::kdebug!("barrier: notifying {} workers", workers_to_awaken);
        self.n_idle.fetch_sub(workers_to_awaken, Ordering::AcqRel);
        if workers_to_awaken > 1 {
            // The releaser does not wait, so it does not post for itself.
            self.sem.release(workers_to_awaken - 1);
        }
    }

    /// Park until the releaser posts a permit
    #[inline]
    pub fn wait(&self) {
        self.sem.acquire();
    }

    /// Number of workers currently idle (hint, may be stale)
    #[inline]
    pub fn idle_workers(&self) -> usize {
        self.n_idle.load(Ordering::Acquire)
    }

    /// Fleet size
    #[inline]
    pub fn n_workers(&self) -> usize {
        self.n_workers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::thread;

    /// Run one full barrier round over `n` threads, counting releasers.
    fn barrier_round(n: usize) -> usize {
        let barrier = Arc::new(IdleBarrier::new(n));
        let resets = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..n)
            .map(|_| {
                let barrier = Arc::clone(&barrier);
                let resets = Arc::clone(&resets);
                thread::spawn(move || {
                    if barrier.arrive() {
                        resets.fetch_add(1, Ordering::SeqCst);
                        barrier.release_peers();
                    } else {
                        barrier.wait();
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(barrier.idle_workers(), 0);
        resets.load(Ordering::SeqCst)
    }

    #[test]
    fn test_exactly_one_releaser() {
        assert_eq!(barrier_round(2), 1);
        assert_eq!(barrier_round(4), 1);
    }

    #[test]
    fn test_single_worker_never_parks() {
        // With a fleet of one, the lone worker is always the releaser.
        assert_eq!(barrier_round(1), 1);
    }

    #[test]
    fn test_repeated_rounds() {
        let n = 3;
        let barrier = Arc::new(IdleBarrier::new(n));

        for _ in 0..10 {
            let handles: Vec<_> = (0..n)
                .map(|_| {
                    let barrier = Arc::clone(&barrier);
                    thread::spawn(move || {
                        if barrier.arrive() {
                            barrier.release_peers();
                        } else {
                            barrier.wait();
                        }
                    })
                })
                .collect();
            for h in handles {
                h.join().unwrap();
            }
            assert_eq!(barrier.idle_workers(), 0);
        }
    }
}
