//! Scheduler façade and instruction interpreter
//!
//! Each worker is a tiny virtual machine over its own straight-line
//! program. `get_ready_reaction` fetches instructions at the worker's
//! program counter and executes them until one of them yields a reaction
//! or tells the worker to exit. There is no event queue and no run-time
//! scheduling decision: every ordering was decided by the schedule
//! generator and shows up here as a counter wait, a delay, or a barrier.

use crate::barrier::IdleBarrier;
use crate::clock;
use crate::config::SchedulerConfig;
use crate::trace::TraceHandle;

use fsched_core::constants::DONT_CARE;
use fsched_core::counter::CounterBank;
use fsched_core::error::{SchedError, SchedResult};
use fsched_core::inst::{Instruction, Opcode, Schedule};
use fsched_core::kdebug;
use fsched_core::reaction::Reaction;
use fsched_core::spinlock::SpinLock;
use fsched_core::tag::{ReactorTag, Tag};

use std::sync::atomic::{AtomicI64, AtomicU32, AtomicUsize, Ordering};

/// Read-only inputs produced by the schedule generator, handed over by the
/// outer runtime at init.
pub struct SchedulerParams {
    /// One straight-line program per worker
    pub schedules: Vec<Schedule>,

    /// Global reaction array; instructions reference reactions by index
    pub reactions: Vec<Reaction>,

    /// Number of reactors (logical-time carriers)
    pub num_reactors: usize,

    /// Length of the shared counter bank
    pub num_counters: usize,

    /// Program timeout relative to the physical start time; `None` runs
    /// until the host stops the workers by other means
    pub timeout_ns: Option<i64>,
}

/// Outcome of executing one instruction
enum Step {
    /// Fetch the next instruction
    Continue,
    /// Hand reaction `idx` to the outer runtime
    Yield(usize),
    /// Tell the worker to exit
    Exit,
}

/// The fully-static scheduler.
///
/// Constructed once by the outer runtime, then shared (behind an `Arc`)
/// with every worker thread. All mutable state is per-worker slots or
/// atomics; the spinlock only guards the `ADV`/`INC` critical sections.
pub struct Scheduler {
    config: SchedulerConfig,

    /// Per-worker programs, read-only after init
    schedules: Box<[Schedule]>,

    /// Reaction instances; the scheduler only ever CASes their status
    reactions: Box<[Reaction]>,

    /// Per-reactor logical tags
    reactors: Box<[ReactorTag]>,

    /// Shared synchronization counters
    counters: CounterBank,

    /// Per-worker program counters (each slot written by its owner only)
    pcs: Box<[AtomicUsize]>,

    /// Per-worker hyperperiod iteration counters
    iterations: Box<[AtomicU32]>,

    /// Idle barrier backing the `SAC` instruction
    barrier: IdleBarrier,

    /// Global scheduler lock for `ADV`/`INC`; held for O(1) work only
    lock: SpinLock<()>,

    /// Physical start time; fixed by `bind_start_time` before any `DU` runs
    start_time: AtomicI64,

    /// Absolute stop tag derived from the timeout at bind time
    stop_time: AtomicI64,
    stop_microstep: AtomicU32,

    timeout_ns: Option<i64>,

    /// Optional listener for barrier blocking events
    trace: Option<TraceHandle>,
}

impl Scheduler {
    /// Build every scheduler structure from generator output.
    ///
    /// This is the first phase of the two-phase init: reactor tags are
    /// provisionally bound to time zero and must be re-bound with
    /// [`Scheduler::bind_start_time`] once the host knows the physical
    /// start time.
    pub fn new(config: SchedulerConfig, params: SchedulerParams) -> SchedResult<Self> {
        config.validate()?;
        if params.schedules.len() != config.num_workers {
            return Err(SchedError::ScheduleMismatch {
                workers: config.num_workers,
                schedules: params.schedules.len(),
            });
        }

        let n = config.num_workers;
        kdebug!("scheduler: initializing with {} workers", n);

        let scheduler = Scheduler {
            schedules: params.schedules.into_boxed_slice(),
            reactions: params.reactions.into_boxed_slice(),
            reactors: (0..params.num_reactors).map(|_| ReactorTag::new(0)).collect(),
            counters: CounterBank::new(params.num_counters),
            pcs: (0..n).map(|_| AtomicUsize::new(0)).collect(),
            iterations: (0..n).map(|_| AtomicU32::new(0)).collect(),
            barrier: IdleBarrier::new(n),
            lock: SpinLock::new(()),
            start_time: AtomicI64::new(0),
            stop_time: AtomicI64::new(i64::MAX),
            stop_microstep: AtomicU32::new(u32::MAX),
            timeout_ns: params.timeout_ns,
            trace: None,
            config,
        };
        scheduler.bind_start_time(0);
        Ok(scheduler)
    }

    /// Second phase of init: fix the physical start time.
    ///
    /// Re-initializes every reactor tag to `(start_time, 0)` and derives
    /// the absolute stop tag from the configured timeout. Calling this
    /// again simply re-binds: the host lifecycle knows the real start
    /// time only after its own setup, so a second call must behave like
    /// the only one.
    pub fn bind_start_time(&self, start_time: i64) {
        self.start_time.store(start_time, Ordering::Release);
        match self.timeout_ns {
            Some(timeout) => {
                self.stop_time
                    .store(start_time.saturating_add(timeout), Ordering::Release);
                self.stop_microstep.store(0, Ordering::Release);
            }
            None => {
                self.stop_time.store(Tag::FOREVER.time, Ordering::Release);
                self.stop_microstep.store(Tag::FOREVER.microstep, Ordering::Release);
            }
        }
        for reactor in self.reactors.iter() {
            reactor.rebind(start_time);
        }
    }

    /// Install a trace listener. Must happen before workers start.
    pub fn install_trace(&mut self, trace: TraceHandle) {
        self.trace = Some(trace);
    }

    /// Explicit teardown. Dropping the scheduler is equivalent; this
    /// method exists so hosts can make the end of life visible. Must not
    /// be called while any worker is inside `get_ready_reaction`.
    pub fn free(self) {
        kdebug!("scheduler: freeing");
    }

    // ------------------------------------------------------------------
    // Worker API
    // ------------------------------------------------------------------

    /// Ask the scheduler for one more reaction.
    ///
    /// Blocks until the worker's program yields a ready reaction, or
    /// returns `None` when the program reached its `STP` and the worker
    /// must exit.
    pub fn get_ready_reaction(&self, worker: usize) -> Option<&Reaction> {
        let program = &self.schedules[worker];
        loop {
            let pc = self.pcs[worker].load(Ordering::Relaxed);
            let inst = program[pc];
            if self.config.debug_logging {
                kdebug!("worker {} [{:>3}] {}", worker, pc, inst);
            }
            match self.execute(worker, inst) {
                Step::Continue => {}
                Step::Yield(idx) => return Some(&self.reactions[idx]),
                Step::Exit => {
                    kdebug!("worker {} leaves the schedule", worker);
                    return None;
                }
            }
        }
    }

    /// Inform the scheduler that `reaction` finished executing.
    ///
    /// The status CAS fails when the reaction was dispatched by an `EXE`
    /// while inactive; that is the normal encoding of known-triggered
    /// reactions, so the failure is ignored.
    pub fn done_with_reaction(&self, _worker: usize, reaction: &Reaction) {
        let _ = reaction.retire();
    }

    /// Request that `reaction` run at the current tag.
    ///
    /// `worker` is `None` for anonymous callers that are not worker
    /// threads. A reaction that is already queued stays queued; the
    /// failing CAS is deliberately ignored rather than treated as fatal.
    pub fn trigger_reaction(&self, reaction: &Reaction, worker: Option<usize>) {
        if !reaction.enqueue() {
            kdebug!(
                "worker {:?}: reaction {} already queued",
                worker,
                reaction.name()
            );
        }
    }

    // ------------------------------------------------------------------
    // Interpreter
    // ------------------------------------------------------------------

    fn execute(&self, worker: usize, inst: Instruction) -> Step {
        match inst.op {
            Opcode::Adv => {
                {
                    let _guard = self.lock.lock();
                    self.reactors[inst.rs1 as usize].advance(inst.rs2, self.stop_tag());
                }
                self.advance_pc(worker);
                Step::Continue
            }
            Opcode::Adv2 => {
                // Single writer by construction of the schedule
                self.reactors[inst.rs1 as usize].advance(inst.rs2, self.stop_tag());
                self.advance_pc(worker);
                Step::Continue
            }
            Opcode::Bit => {
                if self.reactors.iter().all(|r| r.reached_stop()) {
                    self.jump(worker, inst.rs1 as usize);
                } else {
                    self.advance_pc(worker);
                }
                Step::Continue
            }
            Opcode::Du => {
                let iteration = self.iterations[worker].load(Ordering::Relaxed) as i64;
                // Wrapping math is part of the generator contract: a
                // wrapped deadline lands in the past and sleeps zero.
                let wakeup = self
                    .start_time
                    .load(Ordering::Relaxed)
                    .wrapping_add(inst.rs1.wrapping_mul(iteration + 1));
                clock::sleep_until(wakeup);
                self.advance_pc(worker);
                Step::Continue
            }
            Opcode::Eit => {
                let idx = inst.rs1 as usize;
                let step = if self.reactions[idx].is_queued() {
                    Step::Yield(idx)
                } else {
                    Step::Continue
                };
                self.advance_pc(worker);
                step
            }
            Opcode::Exe => {
                self.advance_pc(worker);
                Step::Yield(inst.rs1 as usize)
            }
            Opcode::Inc => {
                {
                    let _guard = self.lock.lock();
                    self.counters.add(inst.rs1 as usize, inst.rs2 as u32);
                }
                self.advance_pc(worker);
                Step::Continue
            }
            Opcode::Inc2 => {
                // Single writer by construction of the schedule
                self.counters.add(inst.rs1 as usize, inst.rs2 as u32);
                self.advance_pc(worker);
                Step::Continue
            }
            Opcode::Jmp => {
                self.jump(worker, inst.rs1 as usize);
                if inst.rs2 != DONT_CARE {
                    self.iterations[worker].fetch_add(1, Ordering::Relaxed);
                }
                Step::Continue
            }
            Opcode::Sac => {
                if let Some(trace) = &self.trace {
                    trace.wait_starts(worker);
                }
                self.wait_for_work(worker);
                if let Some(trace) = &self.trace {
                    trace.wait_ends(worker);
                }
                self.advance_pc(worker);
                Step::Continue
            }
            Opcode::Stp => Step::Exit,
            Opcode::Wu => {
                self.counters.wait_at_least(
                    inst.rs1 as usize,
                    inst.rs2 as u32,
                    self.config.wu_spin_limit,
                );
                self.advance_pc(worker);
                Step::Continue
            }
        }
    }

    /// Park at the barrier; the last worker to idle clears the counters
    /// of the finished hyperperiod and releases the rest.
    fn wait_for_work(&self, worker: usize) {
        if self.barrier.arrive() {
            kdebug!("worker {} is the last idle worker", worker);
            self.counters.clear_all();
            self.barrier.release_peers();
        } else {
            self.barrier.wait();
        }
    }

    #[inline]
    fn advance_pc(&self, worker: usize) {
        self.pcs[worker].fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    fn jump(&self, worker: usize, target: usize) {
        self.pcs[worker].store(target, Ordering::Relaxed);
    }

    #[inline]
    fn stop_tag(&self) -> Tag {
        Tag {
            time: self.stop_time.load(Ordering::Relaxed),
            microstep: self.stop_microstep.load(Ordering::Relaxed),
        }
    }

    // ------------------------------------------------------------------
    // Observability
    // ------------------------------------------------------------------

    /// Number of workers this scheduler drives
    #[inline]
    pub fn num_workers(&self) -> usize {
        self.config.num_workers
    }

    /// Reaction instance by index
    #[inline]
    pub fn reaction(&self, idx: usize) -> &Reaction {
        &self.reactions[idx]
    }

    /// Current value of a synchronization counter
    #[inline]
    pub fn counter(&self, idx: usize) -> u32 {
        self.counters.get(idx)
    }

    /// Current tag of a reactor
    #[inline]
    pub fn reactor_tag(&self, idx: usize) -> Tag {
        self.reactors[idx].load()
    }

    /// Whether a reactor has reached the stop tag
    #[inline]
    pub fn reactor_reached_stop(&self, idx: usize) -> bool {
        self.reactors[idx].reached_stop()
    }

    /// Completed hyperperiod iterations of a worker
    #[inline]
    pub fn iteration(&self, worker: usize) -> u32 {
        self.iterations[worker].load(Ordering::Relaxed)
    }

    /// The bound physical start time
    #[inline]
    pub fn physical_start_time(&self) -> i64 {
        self.start_time.load(Ordering::Acquire)
    }

    /// The configuration this scheduler was built with
    #[inline]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    #[inline]
    pub(crate) fn pc(&self, worker: usize) -> usize {
        self.pcs[worker].load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn idle_workers(&self) -> usize {
        self.barrier.idle_workers()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::SchedTrace;
    use fsched_core::reaction::ReactionStatus;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::thread;

    fn noop_reactions(n: usize) -> Vec<Reaction> {
        (0..n).map(|i| Reaction::new(format!("r{}", i), |_| {})).collect()
    }

    fn single_worker(
        program: Vec<Instruction>,
        reactions: Vec<Reaction>,
        num_reactors: usize,
        timeout_ns: Option<i64>,
    ) -> Scheduler {
        let params = SchedulerParams {
            schedules: vec![program.into_boxed_slice()],
            reactions,
            num_reactors,
            num_counters: 1,
            timeout_ns,
        };
        Scheduler::new(SchedulerConfig::from_env().num_workers(1), params).unwrap()
    }

    #[test]
    fn test_schedule_count_must_match_workers() {
        let params = SchedulerParams {
            schedules: vec![vec![Instruction::stp()].into_boxed_slice()],
            reactions: vec![],
            num_reactors: 0,
            num_counters: 0,
            timeout_ns: None,
        };
        let err = Scheduler::new(SchedulerConfig::from_env().num_workers(2), params);
        assert_eq!(
            err.err(),
            Some(SchedError::ScheduleMismatch { workers: 2, schedules: 1 })
        );
    }

    #[test]
    fn test_stp_returns_none() {
        let sched = single_worker(vec![Instruction::stp()], vec![], 0, None);
        assert!(sched.get_ready_reaction(0).is_none());
        // pc stays on the STP line
        assert_eq!(sched.pc(0), 0);
    }

    #[test]
    fn test_exe_yields_unconditionally() {
        // Scenario: EXE dispatches a reaction whose status never left
        // inactive; done-with-reaction must tolerate the failing CAS.
        let sched = single_worker(
            vec![Instruction::exe(0), Instruction::stp()],
            noop_reactions(1),
            0,
            None,
        );

        let r = sched.get_ready_reaction(0).expect("EXE must yield");
        assert_eq!(r.status(), ReactionStatus::Inactive);

        sched.done_with_reaction(0, r);
        assert_eq!(sched.reaction(0).status(), ReactionStatus::Inactive);

        assert!(sched.get_ready_reaction(0).is_none());
    }

    #[test]
    fn test_eit_yields_only_when_queued() {
        let sched = single_worker(
            vec![Instruction::eit(0), Instruction::eit(0), Instruction::stp()],
            noop_reactions(1),
            0,
            None,
        );

        sched.trigger_reaction(sched.reaction(0), None);
        // Scenario: double trigger before any done - the second CAS fails
        // silently and the reaction is yielded exactly once.
        sched.trigger_reaction(sched.reaction(0), None);

        let r = sched.get_ready_reaction(0).expect("first EIT must yield");
        assert_eq!(r.name(), "r0");
        sched.done_with_reaction(0, r);
        assert_eq!(sched.reaction(0).status(), ReactionStatus::Inactive);

        // Second EIT sees inactive and skips straight to STP
        assert!(sched.get_ready_reaction(0).is_none());
    }

    #[test]
    fn test_trigger_during_running_window_is_a_noop() {
        let sched = single_worker(
            vec![Instruction::eit(0), Instruction::stp()],
            noop_reactions(1),
            0,
            None,
        );

        sched.trigger_reaction(sched.reaction(0), Some(0));
        let r = sched.get_ready_reaction(0).unwrap();

        // Reaction is "running" from the scheduler's point of view; a
        // trigger now must not disturb the status cell.
        sched.trigger_reaction(r, None);
        assert_eq!(r.status(), ReactionStatus::Queued);

        sched.done_with_reaction(0, r);
        assert_eq!(r.status(), ReactionStatus::Inactive);
    }

    #[test]
    fn test_inc_and_wu_within_one_worker() {
        let sched = single_worker(
            vec![
                Instruction::inc(0, 2),
                Instruction::inc2(0, 1),
                Instruction::wu(0, 3),
                Instruction::exe(0),
                Instruction::stp(),
            ],
            noop_reactions(1),
            0,
            None,
        );
        assert!(sched.get_ready_reaction(0).is_some());
        assert_eq!(sched.counter(0), 3);
    }

    #[test]
    fn test_wu_blocks_until_cross_worker_inc() {
        // Scenario A, reduced: consumer's WU releases only after the
        // producer's INC2 lands.
        let producer = vec![
            Instruction::inc2(0, 1),
            Instruction::stp(),
        ];
        let consumer = vec![
            Instruction::wu(0, 1),
            Instruction::exe(0),
            Instruction::stp(),
        ];
        let params = SchedulerParams {
            schedules: vec![producer.into_boxed_slice(), consumer.into_boxed_slice()],
            reactions: noop_reactions(1),
            num_reactors: 0,
            num_counters: 1,
            timeout_ns: None,
        };
        let sched = Arc::new(
            Scheduler::new(SchedulerConfig::from_env().num_workers(2), params).unwrap(),
        );

        let consumer_side = {
            let sched = Arc::clone(&sched);
            thread::spawn(move || {
                let r = sched.get_ready_reaction(1);
                assert!(r.is_some());
                assert!(sched.counter(0) >= 1);
            })
        };

        // Let the consumer reach its spin before the producer runs
        thread::sleep(std::time::Duration::from_millis(20));
        assert!(sched.get_ready_reaction(0).is_none());

        consumer_side.join().unwrap();
    }

    #[test]
    fn test_sac_clears_counters_and_releases_all() {
        // Scenario: counter 0 holds 7 just before the barrier; after the
        // release it reads 0 and exactly one worker ran the reset.
        struct CountingTrace {
            starts: AtomicUsize,
            ends: AtomicUsize,
        }
        impl SchedTrace for CountingTrace {
            fn wait_starts(&self, _worker: usize) {
                self.starts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }
            fn wait_ends(&self, _worker: usize) {
                self.ends.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            }
        }

        let w0 = vec![Instruction::inc(0, 7), Instruction::sac(), Instruction::stp()];
        let w1 = vec![Instruction::sac(), Instruction::stp()];
        let params = SchedulerParams {
            schedules: vec![w0.into_boxed_slice(), w1.into_boxed_slice()],
            reactions: vec![],
            num_reactors: 0,
            num_counters: 1,
            timeout_ns: None,
        };
        let trace = Arc::new(CountingTrace {
            starts: AtomicUsize::new(0),
            ends: AtomicUsize::new(0),
        });
        let mut sched =
            Scheduler::new(SchedulerConfig::from_env().num_workers(2), params).unwrap();
        sched.install_trace(trace.clone());
        let sched = Arc::new(sched);

        let handles: Vec<_> = (0..2)
            .map(|w| {
                let sched = Arc::clone(&sched);
                thread::spawn(move || {
                    assert!(sched.get_ready_reaction(w).is_none());
                    // After the barrier released, the next instruction each
                    // worker fetched was the one right after its own SAC.
                    assert_eq!(sched.pc(w), if w == 0 { 2 } else { 1 });
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(sched.counter(0), 0);
        assert_eq!(sched.idle_workers(), 0);
        assert_eq!(trace.starts.load(std::sync::atomic::Ordering::SeqCst), 2);
        assert_eq!(trace.ends.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[test]
    fn test_bit_jumps_once_all_reactors_reach_stop() {
        // Scenario: both reactors advanced past the stop tag by ADV; the
        // next BIT jumps to the STP line.
        let program = vec![
            Instruction::bit(4),
            Instruction::adv(0, 20),
            Instruction::adv(1, 20),
            Instruction::jmp(0),
            Instruction::stp(),
        ];
        let sched = single_worker(program, vec![], 2, Some(10));

        assert!(sched.get_ready_reaction(0).is_none());
        assert!(sched.reactor_reached_stop(0));
        assert!(sched.reactor_reached_stop(1));
        assert_eq!(sched.pc(0), 4);
    }

    #[test]
    fn test_bit_with_no_reactors_jumps_vacuously() {
        let program = vec![Instruction::bit(2), Instruction::exe(0), Instruction::stp()];
        let sched = single_worker(program, noop_reactions(1), 0, None);
        // An empty reactor scan is vacuously "all stopped"
        assert!(sched.get_ready_reaction(0).is_none());
    }

    #[test]
    fn test_adv2_keeps_advancing_after_stop() {
        let program = vec![
            Instruction::adv2(0, 30),
            Instruction::adv2(0, 30),
            Instruction::stp(),
        ];
        let sched = single_worker(program, vec![], 1, Some(10));
        assert!(sched.get_ready_reaction(0).is_none());
        assert!(sched.reactor_reached_stop(0));
        assert_eq!(sched.reactor_tag(0).time, 60);
    }

    #[test]
    fn test_jmp_with_flag_bumps_iteration() {
        let program = vec![
            Instruction::adv2(0, 10),
            Instruction::bit(4),
            Instruction::jmp_iter(0),
            Instruction::stp(), // unreachable
            Instruction::stp(),
        ];
        let sched = single_worker(program, vec![], 1, Some(30));
        assert!(sched.get_ready_reaction(0).is_none());
        // The body ran three times, so the back-edge JMP executed twice
        assert_eq!(sched.iteration(0), 2);
    }

    #[test]
    fn test_bind_start_time_rebinds_tags() {
        // The host lifecycle binds twice; the second bind wins and is
        // indistinguishable from a single init at the final start time.
        let sched = single_worker(vec![Instruction::stp()], vec![], 2, Some(50));

        sched.bind_start_time(100);
        sched.bind_start_time(200);

        assert_eq!(sched.physical_start_time(), 200);
        for i in 0..2 {
            assert_eq!(sched.reactor_tag(i), Tag::new(200, 0));
            assert!(!sched.reactor_reached_stop(i));
        }
    }

    #[test]
    fn test_stop_tag_tracks_rebound_start_time() {
        let program = vec![Instruction::adv2(0, 50), Instruction::stp()];
        let sched = single_worker(program, vec![], 1, Some(50));
        sched.bind_start_time(1_000);

        assert!(sched.get_ready_reaction(0).is_none());
        // tag (1050, 0) against stop (1050, 0)
        assert_eq!(sched.reactor_tag(0).time, 1_050);
        assert!(sched.reactor_reached_stop(0));
    }

    #[test]
    fn test_du_past_deadline_does_not_block() {
        let program = vec![Instruction::du(-1_000_000), Instruction::stp()];
        let sched = single_worker(program, vec![], 0, None);
        sched.bind_start_time(crate::clock::now_ns());

        let start = std::time::Instant::now();
        assert!(sched.get_ready_reaction(0).is_none());
        assert!(start.elapsed() < std::time::Duration::from_millis(50));
    }
}
