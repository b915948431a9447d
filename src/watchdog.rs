//! Run-duration and inactivity cutoffs.
//!
//! Both are checked every tick while the motor is enabled and override any
//! command source. Pulses are not activity; operator commands are.

use crate::config::{validate_run_duration, Instant, WatchdogConfig, DEFAULT_RUN_DURATION_SECS};
use crate::error::Result;
use crate::motor::MotorState;

/// Idle time after which the motor is disabled, in microseconds (5 minutes).
pub const INACTIVITY_TIMEOUT_US: u32 = 300_000_000;

/// Which cutoff fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WatchdogTrip {
    /// Continuous run time reached the configured duration.
    RunDuration,
    /// No operator command for [`INACTIVITY_TIMEOUT_US`].
    Inactivity,
}

/// Safety watchdog.
#[derive(Debug, Clone)]
pub struct Watchdog {
    run_duration_us: u32,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self {
            run_duration_us: DEFAULT_RUN_DURATION_SECS * 1_000_000,
        }
    }
}

impl Watchdog {
    /// Create a watchdog with the default duration cutoff.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a watchdog from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidRunDuration` outside 1-1800 seconds.
    pub fn from_config(config: &WatchdogConfig) -> Result<Self> {
        let mut watchdog = Self::default();
        watchdog.set_run_duration(config.run_duration_secs)?;
        Ok(watchdog)
    }

    /// Change the duration cutoff.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidRunDuration` outside 1-1800 seconds; the
    /// previous cutoff stays in effect.
    pub fn set_run_duration(&mut self, secs: u32) -> Result<()> {
        validate_run_duration(secs)?;
        self.run_duration_us = secs * 1_000_000;
        Ok(())
    }

    /// Duration cutoff in seconds.
    #[inline]
    pub fn run_duration_secs(&self) -> u32 {
        self.run_duration_us / 1_000_000
    }

    /// Evaluate both cutoffs. Disabled motors never trip.
    pub fn check(&self, state: &MotorState, now: Instant) -> Option<WatchdogTrip> {
        if !state.is_enabled() {
            return None;
        }

        if now.micros_since(state.run_started_at()) >= self.run_duration_us {
            return Some(WatchdogTrip::RunDuration);
        }

        if now.micros_since(state.last_activity_at()) >= INACTIVITY_TIMEOUT_US {
            return Some(WatchdogTrip::Inactivity);
        }

        None
    }
}
