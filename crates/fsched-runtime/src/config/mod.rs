//! Scheduler configuration
//!
//! Compile-time defaults with runtime environment overrides.
//!
//! # Configuration Priority (highest wins)
//!
//! 1. Builder methods (programmatic)
//! 2. Environment variables (runtime)
//! 3. Library defaults
//!
//! # Example
//!
//! ```rust,ignore
//! use fsched_runtime::config::SchedulerConfig;
//!
//! // Use defaults with env overrides
//! let config = SchedulerConfig::from_env();
//!
//! // Or customize programmatically
//! let config = SchedulerConfig::from_env().num_workers(2);
//! ```

pub mod defaults;

use fsched_core::constants::MAX_WORKERS;
use fsched_core::env::{env_get, env_get_bool};
use fsched_core::error::{SchedError, SchedResult};

/// Scheduler configuration with builder pattern.
///
/// Use `from_env()` to start with compile-time defaults and apply any
/// environment variable overrides.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Number of worker threads; must match the number of schedules
    pub num_workers: usize,
    /// Pause-hint spins in a `WU` before the waiter starts yielding
    pub wu_spin_limit: u32,
    /// Pin each worker thread to the CPU matching its worker id
    pub pin_workers: bool,
    /// Enable debug logging
    pub debug_logging: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl SchedulerConfig {
    /// Create config from compile-time defaults with environment overrides.
    ///
    /// Environment variables (all optional):
    /// - `FS_NUM_WORKERS` - Number of worker threads
    /// - `FS_WU_SPIN_LIMIT` - Spins before a waiting `WU` backs off
    /// - `FS_PIN_WORKERS` - Pin workers to CPUs (0/1)
    /// - `FS_DEBUG` - Enable debug logging (0/1)
    pub fn from_env() -> Self {
        Self {
            num_workers: env_get("FS_NUM_WORKERS", defaults::NUM_WORKERS),
            wu_spin_limit: env_get("FS_WU_SPIN_LIMIT", defaults::WU_SPIN_LIMIT),
            pin_workers: env_get_bool("FS_PIN_WORKERS", defaults::PIN_WORKERS),
            debug_logging: env_get_bool("FS_DEBUG", defaults::DEBUG_LOGGING),
        }
    }

    /// Set the number of worker threads
    pub fn num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    /// Set the `WU` spin limit
    pub fn wu_spin_limit(mut self, spins: u32) -> Self {
        self.wu_spin_limit = spins;
        self
    }

    /// Enable or disable worker CPU pinning
    pub fn pin_workers(mut self, pin: bool) -> Self {
        self.pin_workers = pin;
        self
    }

    /// Enable or disable debug logging
    pub fn debug_logging(mut self, debug: bool) -> Self {
        self.debug_logging = debug;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> SchedResult<()> {
        if self.num_workers == 0 {
            return Err(SchedError::InvalidConfig("num_workers must be nonzero"));
        }
        if self.num_workers > MAX_WORKERS {
            return Err(SchedError::InvalidConfig("num_workers exceeds MAX_WORKERS"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SchedulerConfig {
            num_workers: defaults::NUM_WORKERS,
            wu_spin_limit: defaults::WU_SPIN_LIMIT,
            pin_workers: defaults::PIN_WORKERS,
            debug_logging: defaults::DEBUG_LOGGING,
        };
        assert_eq!(config.num_workers, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = SchedulerConfig::from_env().num_workers(2).pin_workers(true);
        assert_eq!(config.num_workers, 2);
        assert!(config.pin_workers);
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let config = SchedulerConfig::from_env().num_workers(0);
        assert_eq!(
            config.validate(),
            Err(SchedError::InvalidConfig("num_workers must be nonzero"))
        );
    }

    #[test]
    fn test_validate_rejects_too_many_workers() {
        let config = SchedulerConfig::from_env().num_workers(MAX_WORKERS + 1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_override() {
        std::env::set_var("FS_WU_SPIN_LIMIT", "512");
        let config = SchedulerConfig::from_env();
        assert_eq!(config.wu_spin_limit, 512);
        std::env::remove_var("FS_WU_SPIN_LIMIT");
    }
}
