//! Worker thread harness
//!
//! The scheduler itself never creates threads; this module is the thin
//! outer runtime that does. Each worker thread repeatedly asks the
//! scheduler for a reaction, runs its body, and reports completion. A
//! `None` from `get_ready_reaction` is the exit signal.

use crate::clock;
use crate::scheduler::Scheduler;

use fsched_core::kprint;

use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Pool of worker threads driving one scheduler
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn one thread per worker the scheduler was configured with
    pub fn start(scheduler: Arc<Scheduler>) -> Self {
        let pin = pin_requested(&scheduler);
        let mut handles = Vec::with_capacity(scheduler.num_workers());
        for worker in 0..scheduler.num_workers() {
            let scheduler = Arc::clone(&scheduler);
            let handle = thread::Builder::new()
                .name(format!("fsched-worker-{}", worker))
                .spawn(move || {
                    worker_main(&scheduler, worker, pin);
                })
                .expect("Failed to spawn worker thread");
            handles.push(handle);
        }
        WorkerPool { handles }
    }

    /// Wait for every worker to run off the end of its schedule
    pub fn join(self) {
        for handle in self.handles {
            let _ = handle.join();
        }
    }

    /// Number of workers in the pool
    #[inline]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

fn pin_requested(scheduler: &Scheduler) -> bool {
    // Pinning only has an implementation on Linux
    #[cfg(target_os = "linux")]
    {
        scheduler.config().pin_workers
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = scheduler;
        false
    }
}

/// Main loop of one worker thread
fn worker_main(scheduler: &Scheduler, worker: usize, pin: bool) {
    kprint::set_worker_id(worker as u32);
    if pin {
        pin_to_cpu(worker);
    }

    while let Some(reaction) = scheduler.get_ready_reaction(worker) {
        reaction.invoke(worker);
        scheduler.done_with_reaction(worker, reaction);
    }

    fsched_core::kdebug!("worker {} exiting", worker);
    kprint::clear_worker_id();
}

#[cfg(target_os = "linux")]
fn pin_to_cpu(worker: usize) {
    use nix::sched::{sched_setaffinity, CpuSet};
    use nix::unistd::Pid;

    let mut cpuset = CpuSet::new();
    if cpuset.set(worker % CpuSet::count()).is_ok() {
        if let Err(e) = sched_setaffinity(Pid::from_raw(0), &cpuset) {
            fsched_core::kwarn!("worker {}: failed to set affinity: {}", worker, e);
        }
    }
}

#[cfg(not(target_os = "linux"))]
fn pin_to_cpu(_worker: usize) {}

/// Bind the physical start time to "now", run every worker to the end of
/// its schedule, and join the pool.
pub fn run_to_completion(scheduler: &Arc<Scheduler>) {
    scheduler.bind_start_time(clock::now_ns());
    WorkerPool::start(Arc::clone(scheduler)).join();
}
