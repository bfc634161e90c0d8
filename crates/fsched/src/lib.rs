//! # fsched - Fully-Static Scheduler
//!
//! A scheduler for deterministic, reactor-oriented programs whose entire
//! dispatch order is decided at program generation time. A compiler emits
//! one straight-line program per worker thread in a small instruction set;
//! at run time each worker is a tiny virtual machine interpreting its own
//! program. There is no event queue, no priority queue, and no topological
//! sort at run time: all cross-worker ordering is explicit synchronization
//! instructions (counter waits, physical-time delays, a barrier).
//!
//! ## Instruction set
//!
//! | Mnemonic | Meaning |
//! |----------|---------|
//! | `ADV`/`ADV2` | Advance a reactor's logical time (locked / single-writer) |
//! | `BIT` | Branch once every reactor reached the stop tag |
//! | `DU` | Delay until an absolute physical time |
//! | `EIT` | Yield a reaction if it was triggered |
//! | `EXE` | Yield a reaction unconditionally |
//! | `INC`/`INC2` | Bump a synchronization counter (locked / single-writer) |
//! | `JMP` | Jump, optionally counting a hyperperiod iteration |
//! | `SAC` | Barrier: sync all workers and clear the counters |
//! | `STP` | Stop the worker |
//! | `WU` | Spin until a counter reaches a threshold |
//!
//! ## Quick Start
//!
//! ```ignore
//! use fsched::{Instruction, Reaction, Scheduler, SchedulerConfig, SchedulerParams};
//! use std::sync::Arc;
//!
//! let program = vec![Instruction::exe(0), Instruction::stp()].into_boxed_slice();
//! let params = SchedulerParams {
//!     schedules: vec![program],
//!     reactions: vec![Reaction::new("startup", |w| println!("hello from worker {w}"))],
//!     num_reactors: 0,
//!     num_counters: 0,
//!     timeout_ns: None,
//! };
//!
//! let sched = Arc::new(Scheduler::new(SchedulerConfig::from_env(), params)?);
//! fsched::run_to_completion(&sched);
//! # Ok::<(), fsched::SchedError>(())
//! ```

// Re-export core types
pub use fsched_core::{
    CounterBank, Instruction, Opcode, Reaction, ReactionStatus, ReactorTag, Schedule, SchedError,
    SchedResult, SpinLock, Tag,
};

// Re-export kprint macros for debug logging
pub use fsched_core::kprint::{init as init_logging, set_flush_enabled, set_log_level, LogLevel};
pub use fsched_core::{kdebug, kerror, kinfo, ktrace, kwarn};

// Re-export env utilities
pub use fsched_core::{env_get, env_get_bool, env_get_opt};

// Re-export runtime types
pub use fsched_runtime::{
    run_to_completion, IdleBarrier, SchedTrace, Scheduler, SchedulerConfig, SchedulerParams,
    WorkerPool,
};

/// Wall-clock helpers used for `DU` deadlines
pub mod clock {
    pub use fsched_runtime::clock::{now_ns, sleep_until};
}
