//! Producer/consumer demo with a linked-in schedule
//!
//! Two source reactors feed one sink. Worker 0 runs the second source;
//! worker 1 runs the first source and the whole sink. The sink's middle
//! reaction is data-dependent: the first source triggers it each
//! hyperperiod, and worker 1 waits on counter 0 until worker 0's source
//! has published before probing the last sink reaction.
//!
//! Environment:
//! - `FS_DEMO_HYPERPERIODS` - how many 10 ms hyperperiods to run (default 5)
//! - `FS_LOG_LEVEL=debug` - watch the interpreters single-step

use fsched::{
    env_get, kinfo, run_to_completion, Instruction, Reaction, Scheduler, SchedulerConfig,
    SchedulerParams,
};
use std::sync::{Arc, OnceLock};

const MS: i64 = 1_000_000;

// Reaction indices: [0=source.0, 1=source2.0, 2=sink.0, 3=sink.1, 4=sink.2]
// Reactor indices:  [0=source, 1=source2, 2=sink]

/// Reaction bodies trigger downstream reactions through this handle
static SCHEDULER: OnceLock<Arc<Scheduler>> = OnceLock::new();

static WORKER_0: [Instruction; 7] = [
    Instruction::bit(6),
    Instruction::exe(1),          // EXE source2.0
    Instruction::inc2(0, 1),      // publish to the sink's last reaction
    Instruction::adv2(1, 10 * MS),
    Instruction::du(10 * MS),
    Instruction::jmp_iter(0),
    Instruction::stp(),
];

static WORKER_1: [Instruction; 14] = [
    Instruction::bit(13),
    Instruction::exe(0),          // EXE source.0
    Instruction::adv2(0, 10 * MS),
    Instruction::exe(2),          // EXE sink.0
    Instruction::eit(3),          // sink.1 if source triggered it
    Instruction::wu(0, 1),        // wait for source2's publication
    Instruction::eit(4),          // sink.2 if anyone triggered it
    Instruction::adv2(2, 5 * MS),
    Instruction::du(5 * MS),
    Instruction::exe(2),          // EXE sink.0 again mid-hyperperiod
    Instruction::adv2(2, 5 * MS),
    Instruction::du(10 * MS),
    Instruction::jmp_iter(0),
    Instruction::stp(),
];

fn reactions() -> Vec<Reaction> {
    vec![
        Reaction::new("source.0", |worker| {
            kinfo!("source.0 fires on worker {}", worker);
            // The source's output triggers the sink's data-dependent reaction
            if let Some(sched) = SCHEDULER.get() {
                sched.trigger_reaction(sched.reaction(3), Some(worker));
            }
        }),
        Reaction::new("source2.0", |worker| {
            kinfo!("source2.0 fires on worker {}", worker);
            // Triggers sink.2 on the other worker; the INC2 that follows
            // this reaction publishes the trigger before the sink's WU
            // releases.
            if let Some(sched) = SCHEDULER.get() {
                sched.trigger_reaction(sched.reaction(4), Some(worker));
            }
        }),
        Reaction::new("sink.0", |worker| {
            kinfo!("sink.0 fires on worker {}", worker);
        }),
        Reaction::new("sink.1", |worker| {
            kinfo!("sink.1 fires on worker {}", worker);
        }),
        Reaction::new("sink.2", |worker| {
            kinfo!("sink.2 fires on worker {}", worker);
        }),
    ]
}

fn main() {
    fsched::init_logging();

    let hyperperiods: i64 = env_get("FS_DEMO_HYPERPERIODS", 5);

    let params = SchedulerParams {
        schedules: vec![
            WORKER_0.to_vec().into_boxed_slice(),
            WORKER_1.to_vec().into_boxed_slice(),
        ],
        reactions: reactions(),
        num_reactors: 3,
        num_counters: 1,
        timeout_ns: Some(hyperperiods * 10 * MS),
    };

    let config = SchedulerConfig::from_env().num_workers(2);
    let sched = Arc::new(Scheduler::new(config, params).expect("scheduler init failed"));
    SCHEDULER.set(Arc::clone(&sched)).ok();

    kinfo!("running {} hyperperiods of 10 ms", hyperperiods);
    let start = std::time::Instant::now();
    run_to_completion(&sched);
    kinfo!(
        "done after {:?}; worker iterations: [{}, {}]",
        start.elapsed(),
        sched.iteration(0),
        sched.iteration(1)
    );
}
