//! Error types for the FS scheduler
//!
//! Only lifecycle and configuration problems surface as errors. Structural
//! defects in a schedule (unknown opcodes, out-of-range indices) are
//! generator bugs and abort the run instead of propagating.

use core::fmt;

/// Result type for scheduler operations
pub type SchedResult<T> = Result<T, SchedError>;

/// Errors that can occur in scheduler operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedError {
    /// Scheduler already initialized
    AlreadyInitialized,

    /// Scheduler not initialized
    NotInitialized,

    /// Configuration failed validation
    InvalidConfig(&'static str),

    /// Schedule tables do not match the configured worker count
    ScheduleMismatch { workers: usize, schedules: usize },
}

impl fmt::Display for SchedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedError::AlreadyInitialized => write!(f, "scheduler already initialized"),
            SchedError::NotInitialized => write!(f, "scheduler not initialized"),
            SchedError::InvalidConfig(reason) => write!(f, "invalid configuration: {}", reason),
            SchedError::ScheduleMismatch { workers, schedules } => write!(
                f,
                "schedule table mismatch: {} workers but {} schedules",
                workers, schedules
            ),
        }
    }
}

impl std::error::Error for SchedError {}
