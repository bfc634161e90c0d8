//! Compile-time configuration defaults

use fsched_core::counter::DEFAULT_SPIN_LIMIT;

/// Number of worker threads when nothing is configured.
///
/// A generated program normally carries its own worker count; the default
/// matches the single-worker build of the generator.
pub const NUM_WORKERS: usize = 1;

/// Pause-hint spins in a `WU` before the waiter starts yielding
pub const WU_SPIN_LIMIT: u32 = DEFAULT_SPIN_LIMIT;

/// Workers are not pinned unless the host asks for it
pub const PIN_WORKERS: bool = false;

/// Debug logging off by default
pub const DEBUG_LOGGING: bool = false;
