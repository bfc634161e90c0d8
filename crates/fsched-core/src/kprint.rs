//! Kernel-style print macros
//!
//! Leveled, thread-safe stderr output with the calling worker's id on
//! every line, so interleaved output from several workers stays
//! readable.
//!
//! # Environment Variables
//!
//! - `FS_LOG_LEVEL=<level>` - 0=off, 1=error, 2=warn, 3=info, 4=debug, 5=trace
//! - `FS_FLUSH_EPRINT=1` - flush stderr after every line
//! - `FS_KPRINT_TIME=1` - prefix lines with nanoseconds since startup
//!
//! # Output Format
//!
//! `[LEVEL] [w<worker>] message`, with an optional `[<ns>]` timestamp
//! between the level and the context.

use crate::env::env_get_bool;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::Instant;

/// Log levels, lowest to most verbose
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    fn parse(s: &str) -> LogLevel {
        match s.to_lowercase().as_str() {
            "off" | "0" => LogLevel::Off,
            "error" | "1" => LogLevel::Error,
            "warn" | "2" => LogLevel::Warn,
            "info" | "3" => LogLevel::Info,
            "debug" | "4" => LogLevel::Debug,
            "trace" | "5" => LogLevel::Trace,
            _ => LogLevel::Info,
        }
    }

    fn tag(self) -> &'static str {
        match self {
            LogLevel::Off => "",
            LogLevel::Error => "[ERROR]",
            LogLevel::Warn => "[WARN] ",
            LogLevel::Info => "[INFO] ",
            LogLevel::Debug => "[DEBUG]",
            LogLevel::Trace => "[TRACE]",
        }
    }
}

static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);
static FLUSH: AtomicBool = AtomicBool::new(false);
static STAMP: AtomicBool = AtomicBool::new(false);
static INITIALIZED: AtomicBool = AtomicBool::new(false);
static EPOCH: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Read the logging configuration from the environment.
///
/// Happens implicitly on the first log line; call it explicitly when the
/// first line must already honor the environment.
pub fn init() {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return;
    }
    EPOCH.get_or_init(Instant::now);
    FLUSH.store(env_get_bool("FS_FLUSH_EPRINT", false), Ordering::Relaxed);
    STAMP.store(env_get_bool("FS_KPRINT_TIME", false), Ordering::Relaxed);
    if let Ok(val) = std::env::var("FS_LOG_LEVEL") {
        LOG_LEVEL.store(LogLevel::parse(&val) as u8, Ordering::Relaxed);
    }
}

#[inline]
fn ensure_init() {
    if !INITIALIZED.load(Ordering::Relaxed) {
        init();
    }
}

/// Override the log level at run time
pub fn set_log_level(level: LogLevel) {
    ensure_init();
    LOG_LEVEL.store(level as u8, Ordering::Relaxed);
}

/// Override flushing at run time
pub fn set_flush_enabled(enabled: bool) {
    ensure_init();
    FLUSH.store(enabled, Ordering::Relaxed);
}

/// Whether lines at `level` currently reach stderr
#[inline]
pub fn level_enabled(level: LogLevel) -> bool {
    ensure_init();
    level as u8 <= LOG_LEVEL.load(Ordering::Relaxed)
}

/// Nanoseconds since logging startup
#[inline]
pub fn elapsed_ns() -> u64 {
    EPOCH.get_or_init(Instant::now).elapsed().as_nanos() as u64
}

// The worker harness tags its threads so log lines carry the worker id
thread_local! {
    static WORKER_ID: std::cell::Cell<Option<u32>> = const { std::cell::Cell::new(None) };
}

/// Tag the calling thread as worker `id`
pub fn set_worker_id(id: u32) {
    WORKER_ID.with(|w| w.set(Some(id)));
}

/// Remove the worker tag from the calling thread
pub fn clear_worker_id() {
    WORKER_ID.with(|w| w.set(None));
}

/// Worker id of the calling thread, if it is a worker
#[inline]
pub fn get_worker_id() -> Option<u32> {
    WORKER_ID.with(|w| w.get())
}

#[doc(hidden)]
pub fn _klog_impl(level: LogLevel, args: std::fmt::Arguments<'_>) {
    if !level_enabled(level) {
        return;
    }

    let stderr = std::io::stderr();
    let mut out = stderr.lock();

    let _ = write!(out, "{} ", level.tag());
    if STAMP.load(Ordering::Relaxed) {
        let _ = write!(out, "[{}] ", elapsed_ns());
    }
    match get_worker_id() {
        Some(id) => {
            let _ = write!(out, "[w{}] ", id);
        }
        None => {
            let _ = out.write_all(b"[w--] ");
        }
    }
    let _ = out.write_fmt(args);
    let _ = out.write_all(b"\n");

    if FLUSH.load(Ordering::Relaxed) {
        let _ = out.flush();
    }
}

// ============================================================================
// Public Macros
// ============================================================================

/// Error level log with worker context
#[macro_export]
macro_rules! kerror {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl(
            $crate::kprint::LogLevel::Error,
            format_args!($($arg)*)
        );
    }};
}

/// Warning level log with worker context
#[macro_export]
macro_rules! kwarn {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl(
            $crate::kprint::LogLevel::Warn,
            format_args!($($arg)*)
        );
    }};
}

/// Info level log with worker context
#[macro_export]
macro_rules! kinfo {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl(
            $crate::kprint::LogLevel::Info,
            format_args!($($arg)*)
        );
    }};
}

/// Debug level log with worker context
#[macro_export]
macro_rules! kdebug {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl(
            $crate::kprint::LogLevel::Debug,
            format_args!($($arg)*)
        );
    }};
}

/// Trace level log with worker context
#[macro_export]
macro_rules! ktrace {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl(
            $crate::kprint::LogLevel::Trace,
            format_args!($($arg)*)
        );
    }};
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_ordered() {
        assert!(LogLevel::Off < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Debug);
        assert!(LogLevel::Debug < LogLevel::Trace);
    }

    #[test]
    fn test_parse_accepts_names_and_numbers() {
        assert_eq!(LogLevel::parse("off"), LogLevel::Off);
        assert_eq!(LogLevel::parse("ERROR"), LogLevel::Error);
        assert_eq!(LogLevel::parse("4"), LogLevel::Debug);
        assert_eq!(LogLevel::parse("bogus"), LogLevel::Info);
    }

    #[test]
    fn test_worker_tagging() {
        assert_eq!(get_worker_id(), None);
        set_worker_id(9);
        assert_eq!(get_worker_id(), Some(9));
        clear_worker_id();
        assert_eq!(get_worker_id(), None);
    }

    #[test]
    fn test_elapsed_ns_grows() {
        let before = elapsed_ns();
        std::thread::sleep(std::time::Duration::from_millis(1));
        assert!(elapsed_ns() > before);
    }

    #[test]
    fn test_macros_compile() {
        set_log_level(LogLevel::Off);
        kerror!("error {}", 1);
        kwarn!("warn");
        kinfo!("info");
        kdebug!("debug");
        ktrace!("trace");
    }
}
