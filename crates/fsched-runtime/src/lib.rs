//! # fsched-runtime
//!
//! Runtime half of the fsched fully-static scheduler.
//!
//! This crate provides:
//! - The per-worker instruction interpreter and scheduler façade
//! - The idle barrier and its counting semaphore (futex on Linux)
//! - Wall-clock access and absolute-deadline sleeping for `DU`
//! - The worker thread harness that drives `get_ready_reaction`
//! - Trace hooks around the barrier's blocking section

#![allow(dead_code)]

pub mod barrier;
pub mod clock;
pub mod config;
pub mod scheduler;
pub mod sem;
pub mod trace;
pub mod worker;

// Re-exports
pub use barrier::IdleBarrier;
pub use config::SchedulerConfig;
pub use scheduler::{Scheduler, SchedulerParams};
pub use trace::SchedTrace;
pub use worker::{run_to_completion, WorkerPool};
