//! Logical tags and per-reactor tag records
//!
//! Reactors hold no code in this runtime; they are carriers of logical
//! time. A tag is a `(time, microstep)` pair ordered lexicographically.
//! Only the `ADV`/`ADV2` instructions advance a reactor's tag.

use core::fmt;
use core::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, Ordering};

/// A `(time, microstep)` logical timestamp.
///
/// Field order gives the derived `Ord` the lexicographic comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Tag {
    /// Logical time in nanoseconds since the epoch
    pub time: i64,
    /// Microstep within the logical time instant
    pub microstep: u32,
}

impl Tag {
    /// The zero tag
    pub const ZERO: Tag = Tag { time: 0, microstep: 0 };

    /// A tag no reactor ever reaches; used when no timeout is configured
    pub const FOREVER: Tag = Tag { time: i64::MAX, microstep: u32::MAX };

    #[inline]
    pub const fn new(time: i64, microstep: u32) -> Self {
        Tag { time, microstep }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.time, self.microstep)
    }
}

/// Per-reactor tag record.
///
/// `time` and `microstep` have a single writer at any point in the
/// schedule: either the worker holding the global scheduler lock (`ADV`)
/// or the one worker the generator designated (`ADV2`). `reached_stop` is
/// read concurrently by every worker executing a `BIT` scan, hence the
/// acquire/release pairing on that flag.
pub struct ReactorTag {
    time: AtomicI64,
    microstep: AtomicU32,
    reached_stop: AtomicBool,
}

impl ReactorTag {
    pub fn new(start_time: i64) -> Self {
        ReactorTag {
            time: AtomicI64::new(start_time),
            microstep: AtomicU32::new(0),
            reached_stop: AtomicBool::new(false),
        }
    }

    /// Current tag value
    #[inline]
    pub fn load(&self) -> Tag {
        Tag {
            time: self.time.load(Ordering::Acquire),
            microstep: self.microstep.load(Ordering::Acquire),
        }
    }

    /// True once the reactor's tag has reached or passed the stop tag
    #[inline]
    pub fn reached_stop(&self) -> bool {
        self.reached_stop.load(Ordering::Acquire)
    }

    /// Advance logical time by `delta` and reset the microstep.
    ///
    /// Single-writer: the caller either holds the global scheduler lock or
    /// is the one worker the generator allows to touch this reactor.
    /// The stop flag is sticky; advancing past the stop tag never clears
    /// it, and the tag keeps moving even after the stop is reached.
    pub fn advance(&self, delta: i64, stop: Tag) {
        let time = self.time.load(Ordering::Relaxed).wrapping_add(delta);
        self.time.store(time, Ordering::Release);
        self.microstep.store(0, Ordering::Release);
        if Tag::new(time, 0) >= stop {
            self.reached_stop.store(true, Ordering::Release);
        }
    }

    /// Reset the tag to `(start_time, 0)` and clear the stop flag.
    ///
    /// Used by the two-phase init, before any worker is running.
    pub fn rebind(&self, start_time: i64) {
        self.time.store(start_time, Ordering::Release);
        self.microstep.store(0, Ordering::Release);
        self.reached_stop.store(false, Ordering::Release);
    }
}

impl fmt::Debug for ReactorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactorTag")
            .field("tag", &self.load())
            .field("reached_stop", &self.reached_stop())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_ordering_is_lexicographic() {
        assert!(Tag::new(1, 0) < Tag::new(2, 0));
        assert!(Tag::new(1, 5) < Tag::new(2, 0));
        assert!(Tag::new(3, 1) > Tag::new(3, 0));
        assert_eq!(Tag::new(4, 2), Tag::new(4, 2));
        assert!(Tag::ZERO < Tag::FOREVER);
    }

    #[test]
    fn test_advance_accumulates_time() {
        let r = ReactorTag::new(100);
        r.advance(10, Tag::FOREVER);
        r.advance(10, Tag::FOREVER);
        assert_eq!(r.load(), Tag::new(120, 0));
        assert!(!r.reached_stop());
    }

    #[test]
    fn test_advance_resets_microstep() {
        let r = ReactorTag::new(0);
        r.microstep.store(3, Ordering::Relaxed);
        r.advance(1, Tag::FOREVER);
        assert_eq!(r.load().microstep, 0);
    }

    #[test]
    fn test_stop_flag_sets_at_stop_tag() {
        let r = ReactorTag::new(0);
        r.advance(5, Tag::new(10, 0));
        assert!(!r.reached_stop());
        r.advance(5, Tag::new(10, 0));
        assert!(r.reached_stop());
    }

    #[test]
    fn test_stop_flag_is_sticky() {
        // Advancing past the stop keeps both the flag and the moving tag.
        let r = ReactorTag::new(0);
        r.advance(20, Tag::new(10, 0));
        assert!(r.reached_stop());
        r.advance(20, Tag::new(10, 0));
        assert!(r.reached_stop());
        assert_eq!(r.load().time, 40);
    }

    #[test]
    fn test_rebind_resets_everything() {
        let r = ReactorTag::new(0);
        r.advance(50, Tag::new(10, 0));
        assert!(r.reached_stop());

        r.rebind(1000);
        assert_eq!(r.load(), Tag::new(1000, 0));
        assert!(!r.reached_stop());
    }

    #[test]
    fn test_time_is_monotone_with_nonnegative_deltas() {
        let r = ReactorTag::new(0);
        let mut prev = r.load().time;
        for delta in [0, 1, 3, 7, 100] {
            r.advance(delta, Tag::FOREVER);
            let now = r.load().time;
            assert!(now >= prev);
            prev = now;
        }
    }
}
