//! Shared counter bank
//!
//! A fixed-length array of 32-bit counters used as one-way semaphores
//! between workers. Producers bump a counter (`INC`/`INC2`), consumers spin
//! until it reaches a threshold (`WU`). The spin is intentional: the static
//! schedule bounds the wait by the producer's reaction latency, so a
//! blocking primitive would only add wake-up cost.

use core::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Spins with a pause hint before the waiter starts yielding the CPU
pub const DEFAULT_SPIN_LIMIT: u32 = 128;

// Backoff escalation bounds for long waits
const YIELD_LIMIT: u32 = 1024;
const SLEEP_START_US: u64 = 10;
const SLEEP_MAX_US: u64 = 1000;

/// Process-wide bank of synchronization counters.
///
/// All entries start at zero. The locked (`INC`) and single-writer
/// (`INC2`) increment disciplines both funnel into [`CounterBank::add`];
/// the locked caller holds the global scheduler lock, the lock-free caller
/// is the only writer of that counter by construction of the schedule. The
/// generator never mixes the two disciplines on one counter.
pub struct CounterBank {
    slots: Box<[AtomicU32]>,
}

impl CounterBank {
    /// Create a bank of `len` counters, all zero
    pub fn new(len: usize) -> Self {
        let slots = (0..len).map(|_| AtomicU32::new(0)).collect();
        CounterBank { slots }
    }

    /// Number of counters in the bank
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Add `k` to counter `i`.
    ///
    /// The release ordering pairs with the acquire load in
    /// [`CounterBank::wait_at_least`]: everything the producer wrote before
    /// the increment is visible to a consumer released by it.
    #[inline]
    pub fn add(&self, i: usize, k: u32) {
        self.slots[i].fetch_add(k, Ordering::Release);
    }

    /// Current value of counter `i`
    #[inline]
    pub fn get(&self, i: usize) -> u32 {
        self.slots[i].load(Ordering::Acquire)
    }

    /// Spin until counter `i` is at least `threshold`.
    ///
    /// The first `spin_limit` rounds use a pause hint only; after that the
    /// waiter yields its time slice, and for pathologically long waits it
    /// backs off exponentially up to a millisecond of sleep per probe.
    pub fn wait_at_least(&self, i: usize, threshold: u32, spin_limit: u32) {
        let slot = &self.slots[i];
        let mut rounds = 0u32;
        let mut sleep_us = SLEEP_START_US;
        while slot.load(Ordering::Acquire) < threshold {
            rounds = rounds.wrapping_add(1);
            if rounds <= spin_limit {
                core::hint::spin_loop();
            } else if rounds <= spin_limit.saturating_add(YIELD_LIMIT) {
                std::thread::yield_now();
            } else {
                std::thread::sleep(Duration::from_micros(sleep_us));
                sleep_us = (sleep_us * 2).min(SLEEP_MAX_US);
            }
        }
    }

    /// Reset every counter to zero.
    ///
    /// Only the barrier releaser calls this, while every other worker is
    /// parked on the idle semaphore; the semaphore hand-off publishes the
    /// stores.
    pub fn clear_all(&self) {
        for slot in self.slots.iter() {
            slot.store(0, Ordering::Relaxed);
        }
    }
}

impl core::fmt::Debug for CounterBank {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut list = f.debug_list();
        for slot in self.slots.iter() {
            list.entry(&slot.load(Ordering::Relaxed));
        }
        list.finish()
    }
}
