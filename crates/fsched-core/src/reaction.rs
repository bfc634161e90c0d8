//! Reaction handles and their atomic status machine
//!
//! A reaction is a unit of computation referenced by index into a global
//! array. The scheduler never runs a reaction body itself: it yields the
//! reaction to the outer runtime and only mutates the status cell, always
//! by compare-and-swap.

use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};

/// Status of a reaction within the current tag.
///
/// Only `Inactive` and `Queued` are ever stored in the atomic cell.
/// `Running` names the implicit period between `get_ready_reaction`
/// returning a reaction and `done_with_reaction` being called; during that
/// window the cell still reads `Queued` (or `Inactive`, for reactions
/// dispatched unconditionally by `EXE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReactionStatus {
    /// Not scheduled at the current tag
    Inactive = 0,

    /// Triggered and waiting to be picked up by an `EIT`
    Queued = 1,

    /// Handed to the outer runtime (implicit, never stored)
    Running = 2,
}

impl From<u8> for ReactionStatus {
    fn from(v: u8) -> Self {
        match v {
            0 => ReactionStatus::Inactive,
            1 => ReactionStatus::Queued,
            2 => ReactionStatus::Running,
            _ => ReactionStatus::Inactive, // Default for invalid values
        }
    }
}

impl From<ReactionStatus> for u8 {
    fn from(status: ReactionStatus) -> u8 {
        status as u8
    }
}

impl fmt::Display for ReactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReactionStatus::Inactive => write!(f, "inactive"),
            ReactionStatus::Queued => write!(f, "queued"),
            ReactionStatus::Running => write!(f, "running"),
        }
    }
}

/// Body of a reaction, invoked by the outer runtime with the worker id
pub type ReactionBody = Box<dyn Fn(usize) + Send + Sync>;

/// A reaction instance.
///
/// Owned by the outer runtime; the scheduler holds a read reference and
/// atomically mutates `status`. Both CAS transitions tolerate failure:
/// a double trigger and a `done` after an `EXE` of an inactive reaction
/// are silently ignored.
pub struct Reaction {
    name: Box<str>,
    status: AtomicU8,
    body: ReactionBody,
}

impl Reaction {
    /// Create a reaction with the given body.
    ///
    /// The status starts out `Inactive`; known-triggered reactions
    /// (startup, timers) are dispatched by `EXE` without ever being queued.
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        Reaction {
            name: name.into().into_boxed_str(),
            status: AtomicU8::new(ReactionStatus::Inactive as u8),
            body: Box::new(body),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current stored status
    #[inline]
    pub fn status(&self) -> ReactionStatus {
        ReactionStatus::from(self.status.load(Ordering::Acquire))
    }

    /// True if the reaction is queued at the current tag
    #[inline]
    pub fn is_queued(&self) -> bool {
        self.status.load(Ordering::Acquire) == ReactionStatus::Queued as u8
    }

    /// Mark the reaction queued: CAS `Inactive -> Queued`.
    ///
    /// Returns false if the reaction was already queued; the caller treats
    /// that as a benign double trigger.
    #[inline]
    pub fn enqueue(&self) -> bool {
        self.status
            .compare_exchange(
                ReactionStatus::Inactive as u8,
                ReactionStatus::Queued as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Mark the reaction inactive again: CAS `Queued -> Inactive`.
    ///
    /// Returns false when the reaction was never queued, which is the
    /// normal outcome after an `EXE` of an inactive reaction.
    #[inline]
    pub fn retire(&self) -> bool {
        self.status
            .compare_exchange(
                ReactionStatus::Queued as u8,
                ReactionStatus::Inactive as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Run the reaction body. Called by the outer runtime, never by the
    /// scheduler.
    #[inline]
    pub fn invoke(&self, worker: usize) {
        (self.body)(worker);
    }
}

impl fmt::Debug for Reaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reaction")
            .field("name", &self.name)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}
