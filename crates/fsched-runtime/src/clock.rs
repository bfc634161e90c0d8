//! Wall-clock access and absolute-deadline sleeping
//!
//! `DU` deadlines are absolute wall-clock instants derived from the
//! physical start time, so the clock here is the realtime clock, not a
//! monotonic one. On Linux the sleep uses `clock_nanosleep` with
//! `TIMER_ABSTIME`, which is immune to drift between computing the
//! deadline and going to sleep.

const NS_PER_SEC: i64 = 1_000_000_000;

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        /// Current wall-clock time in nanoseconds since the epoch
        pub fn now_ns() -> i64 {
            let mut ts = libc::timespec { tv_sec: 0, tv_nsec: 0 };
            // Safety: ts is a valid out-pointer for the whole call
            unsafe {
                libc::clock_gettime(libc::CLOCK_REALTIME, &mut ts);
            }
            (ts.tv_sec as i64) * NS_PER_SEC + ts.tv_nsec as i64
        }
    } else {
        /// Current wall-clock time in nanoseconds since the epoch
        pub fn now_ns() -> i64 {
            use std::time::{SystemTime, UNIX_EPOCH};
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as i64)
                .unwrap_or(0)
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(target_os = "linux")] {
        /// Sleep until `deadline_ns` on the realtime clock.
        ///
        /// Returns immediately if the deadline already passed (which is
        /// also what a wrapped deadline computation looks like).
        pub fn sleep_until(deadline_ns: i64) {
            if deadline_ns <= now_ns() {
                return;
            }
            let ts = libc::timespec {
                tv_sec: deadline_ns / NS_PER_SEC,
                tv_nsec: deadline_ns % NS_PER_SEC,
            };
            loop {
                // Safety: ts is valid and remain is unused with TIMER_ABSTIME
                let rc = unsafe {
                    libc::clock_nanosleep(
                        libc::CLOCK_REALTIME,
                        libc::TIMER_ABSTIME,
                        &ts,
                        std::ptr::null_mut(),
                    )
                };
                if rc != libc::EINTR {
                    return;
                }
            }
        }
    } else {
        /// Sleep until `deadline_ns` on the realtime clock.
        ///
        /// Portable variant: re-derives the remaining duration each round
        /// so a coarse sleep cannot overshoot badly.
        pub fn sleep_until(deadline_ns: i64) {
            loop {
                let remaining = deadline_ns - now_ns();
                if remaining <= 0 {
                    return;
                }
                std::thread::sleep(std::time::Duration::from_nanos(remaining as u64));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_now_ns_is_plausible_epoch_time() {
        // Any date after 2020 and before 2100
        let ns = now_ns();
        assert!(ns > 1_577_836_800 * NS_PER_SEC);
        assert!(ns < 4_102_444_800 * NS_PER_SEC);
    }

    #[test]
    fn test_sleep_until_past_deadline_returns_immediately() {
        let start = std::time::Instant::now();
        sleep_until(now_ns() - NS_PER_SEC);
        assert!(start.elapsed() < Duration::from_millis(10));
    }

    #[test]
    fn test_sleep_until_waits() {
        let deadline = now_ns() + 20_000_000; // 20 ms
        sleep_until(deadline);
        assert!(now_ns() >= deadline);
    }
}
