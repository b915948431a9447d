//! Speed adjustment by step interval.

use crate::config::Microstep;
use crate::motor::MotorState;

use super::STEP_INTERVAL_MAX_US;

/// Interval change per speed adjustment, in microseconds.
pub const SPEED_STEP_US: u32 = 10;

/// Speed adjustment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpeedAdjust {
    /// Shorter interval, faster rotation.
    Increase,
    /// Longer interval, slower rotation.
    Decrease,
}

/// Clamp an interval into the bounds of a microstep mode.
#[inline]
pub fn clamp_interval(interval_us: u32, microstep: Microstep) -> u32 {
    interval_us.clamp(microstep.min_step_interval_us(), STEP_INTERVAL_MAX_US)
}

/// Adjust the step interval by one [`SPEED_STEP_US`], saturating at the
/// bounds of the active microstep mode.
///
/// Returns the new interval.
pub fn adjust_speed(state: &mut MotorState, adjust: SpeedAdjust) -> u32 {
    let interval = match adjust {
        SpeedAdjust::Increase => state.step_interval_us.saturating_sub(SPEED_STEP_US),
        SpeedAdjust::Decrease => state.step_interval_us.saturating_add(SPEED_STEP_US),
    };
    state.step_interval_us = clamp_interval(interval, state.microstep);
    state.step_interval_us
}
