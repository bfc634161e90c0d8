//! # fsched-core
//!
//! Core types for the fsched fully-static (FS) scheduler.
//!
//! An FS schedule is compiled ahead of time: every worker thread owns a
//! straight-line program of instructions, and all cross-worker ordering is
//! expressed through explicit synchronization instructions. This crate holds
//! the platform-agnostic pieces; the interpreter, barrier, and worker harness
//! live in `fsched-runtime`.
//!
//! ## Modules
//!
//! - `inst` - Instruction format and opcode table
//! - `counter` - Shared counter bank for producer/consumer synchronization
//! - `reaction` - Reaction handles and their atomic status machine
//! - `tag` - Logical tags and per-reactor tag records
//! - `error` - Error types
//! - `spinlock` - Internal spinlock primitive
//! - `kprint` - Kernel-style debug printing macros
//! - `env` - Environment variable utilities

#![allow(dead_code)]

pub mod counter;
pub mod env;
pub mod error;
pub mod inst;
pub mod kprint;
pub mod reaction;
pub mod spinlock;
pub mod tag;

// Re-exports for convenience
pub use counter::CounterBank;
pub use env::{env_get, env_get_bool, env_get_opt};
pub use error::{SchedError, SchedResult};
pub use inst::{Instruction, Opcode, Schedule};
pub use reaction::{Reaction, ReactionStatus};
pub use spinlock::SpinLock;
pub use tag::{ReactorTag, Tag};

/// Shared constants
pub mod constants {
    /// Maximum workers (OS threads)
    pub const MAX_WORKERS: usize = 64;

    /// Default number of workers when nothing is configured
    pub const DEFAULT_NUM_WORKERS: usize = 1;

    /// Conventional "don't care" operand value in generated schedules
    pub const DONT_CARE: i64 = -1;
}
