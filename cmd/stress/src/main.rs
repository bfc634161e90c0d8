//! Stress test - barrier and counter hammering
//!
//! Runs many back-to-back hyperperiods across N workers. Every
//! hyperperiod each worker executes one reaction, bumps the shared
//! counter under the lock, waits for the whole fleet, and synchronizes at
//! the barrier that clears the counter again. Any lost increment or
//! barrier miscount deadlocks or trips the final asserts.
//!
//! Environment:
//! - `FS_STRESS_WORKERS` - fleet size (default 4)
//! - `FS_STRESS_HYPERPERIODS` - rounds to run (default 10000)

use fsched::{
    env_get, kinfo, run_to_completion, Instruction, Reaction, Schedule, Scheduler,
    SchedulerConfig, SchedulerParams,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn worker_program(own_reactor: i64, fleet: i64) -> Schedule {
    vec![
        Instruction::bit(7),
        Instruction::exe(own_reactor),
        Instruction::inc(0, 1),
        Instruction::wu(0, fleet),
        Instruction::adv2(own_reactor, 1),
        Instruction::sac(),
        Instruction::jmp(0),
        Instruction::stp(),
    ]
    .into_boxed_slice()
}

fn main() {
    fsched::init_logging();

    let workers: usize = env_get("FS_STRESS_WORKERS", 4);
    let hyperperiods: i64 = env_get("FS_STRESS_HYPERPERIODS", 10_000);

    let invocations: Arc<Vec<AtomicUsize>> =
        Arc::new((0..workers).map(|_| AtomicUsize::new(0)).collect());

    let reactions = (0..workers)
        .map(|w| {
            let invocations = Arc::clone(&invocations);
            Reaction::new(format!("hammer.{}", w), move |_| {
                invocations[w].fetch_add(1, Ordering::Relaxed);
            })
        })
        .collect();

    let params = SchedulerParams {
        schedules: (0..workers)
            .map(|w| worker_program(w as i64, workers as i64))
            .collect(),
        reactions,
        num_reactors: workers,
        num_counters: 1,
        // Each hyperperiod advances every reactor by one logical nanosecond
        timeout_ns: Some(hyperperiods),
    };

    let config = SchedulerConfig::from_env().num_workers(workers);
    let sched = Arc::new(Scheduler::new(config, params).expect("scheduler init failed"));

    kinfo!("{} workers x {} hyperperiods", workers, hyperperiods);
    let start = std::time::Instant::now();
    run_to_completion(&sched);
    let elapsed = start.elapsed();

    for w in 0..workers {
        let count = invocations[w].load(Ordering::Relaxed);
        assert_eq!(
            count, hyperperiods as usize,
            "worker {} ran {} of {} hyperperiods",
            w, count, hyperperiods
        );
    }
    assert_eq!(sched.counter(0), 0, "final barrier left a dirty counter");

    kinfo!(
        "ok: {} barrier rounds in {:?} ({:.1} rounds/ms)",
        hyperperiods,
        elapsed,
        hyperperiods as f64 / elapsed.as_millis().max(1) as f64
    );
}
