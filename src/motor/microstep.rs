//! Microstep resolution bookkeeping.

use crate::config::Microstep;
use crate::motion::clamp_interval;

use super::state::MotorState;

/// Apply a new resolution to the motor state.
///
/// Recomputes pulses per revolution from the base step count and re-clamps
/// the step interval into the new mode's bounds. Returns the clamped interval.
pub(crate) fn apply_microstep(
    state: &mut MotorState,
    microstep: Microstep,
    steps_per_revolution: u16,
) -> u32 {
    state.microstep = microstep;
    state.pulses_per_revolution = u32::from(steps_per_revolution) * u32::from(microstep.value());
    state.step_interval_us = clamp_interval(state.step_interval_us, microstep);
    state.step_interval_us
}
