//! Step pulse generation.

use crate::config::Instant;
use crate::error::Result;
use crate::motor::{MotorDriver, MotorState};

/// Non-blocking step pulse generator.
///
/// The only component that toggles the step line during a run. Each call to
/// [`tick`](Self::tick) emits at most one pulse.
#[derive(Debug, Clone, Default)]
pub struct PulseGenerator {
    /// When the last pulse was emitted.
    last_pulse_at: Instant,

    /// Pulses emitted since creation (wrapping).
    pulse_count: u32,
}

impl PulseGenerator {
    /// Create a generator whose first pulse is due one interval after `now`.
    pub fn new(now: Instant) -> Self {
        Self {
            last_pulse_at: now,
            pulse_count: 0,
        }
    }

    /// Drive the enable line from `state` and emit a pulse when one is due.
    ///
    /// Returns `true` if a pulse was emitted.
    pub fn tick<D: MotorDriver>(
        &mut self,
        now: Instant,
        state: &MotorState,
        driver: &mut D,
    ) -> Result<bool> {
        if !state.is_enabled() {
            driver.set_enabled(false)?;
            return Ok(false);
        }

        driver.set_enabled(true)?;

        if now.micros_since(self.last_pulse_at) < state.step_interval_us() {
            return Ok(false);
        }

        driver.pulse()?;
        self.last_pulse_at = now;
        self.pulse_count = self.pulse_count.wrapping_add(1);
        Ok(true)
    }

    /// When the last pulse was emitted.
    #[inline]
    pub fn last_pulse_at(&self) -> Instant {
        self.last_pulse_at
    }

    /// Pulses emitted so far.
    #[inline]
    pub fn pulse_count(&self) -> u32 {
        self.pulse_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Microstep;
    use crate::motor::testing::RecordingDriver;

    fn enabled_state(interval: u32) -> MotorState {
        let mut state = MotorState::new(interval, Microstep::Sixteenth, 3200, Instant(0));
        state.enabled = true;
        state
    }

    #[test]
    fn test_disabled_deasserts_and_never_pulses() {
        let mut generator = PulseGenerator::new(Instant(0));
        let mut driver = RecordingDriver::default();
        let state = MotorState::new(200, Microstep::Sixteenth, 3200, Instant(0));

        for t in (0..10_000).step_by(100) {
            assert!(!generator.tick(Instant(t), &state, &mut driver).unwrap());
        }
        assert_eq!(driver.pulses, 0);
        assert!(!driver.enabled);
    }

    #[test]
    fn test_pulses_respect_interval() {
        let mut generator = PulseGenerator::new(Instant(0));
        let mut driver = RecordingDriver::default();
        let state = enabled_state(200);

        assert!(!generator.tick(Instant(199), &state, &mut driver).unwrap());
        assert!(driver.enabled);
        assert!(generator.tick(Instant(200), &state, &mut driver).unwrap());
        assert!(!generator.tick(Instant(300), &state, &mut driver).unwrap());
        assert!(generator.tick(Instant(400), &state, &mut driver).unwrap());
        assert_eq!(driver.pulses, 2);
        assert_eq!(generator.pulse_count(), 2);
    }

    #[test]
    fn test_one_pulse_per_tick_when_late() {
        let mut generator = PulseGenerator::new(Instant(0));
        let mut driver = RecordingDriver::default();
        let state = enabled_state(100);

        // A late tick still emits only one pulse.
        assert!(generator.tick(Instant(10_000), &state, &mut driver).unwrap());
        assert_eq!(driver.pulses, 1);
        assert_eq!(generator.last_pulse_at(), Instant(10_000));
    }

    #[test]
    fn test_interval_across_timer_wrap() {
        let start = Instant(u32::MAX - 50);
        let mut generator = PulseGenerator::new(start);
        let mut driver = RecordingDriver::default();
        let state = enabled_state(100);

        assert!(!generator.tick(start.add_micros(99), &state, &mut driver).unwrap());
        assert!(generator.tick(start.add_micros(100), &state, &mut driver).unwrap());
    }
}
