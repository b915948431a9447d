//! Motor state record.
//!
//! A single owned record mutated only by [`MotorController`](super::MotorController).

use crate::config::{Instant, Microstep};

/// Rotation direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Forward rotation (DIR high unless inverted).
    #[default]
    Forward,
    /// Reverse rotation.
    Reverse,
}

impl Direction {
    /// The opposite direction.
    #[inline]
    pub fn reversed(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }

    /// `true` for forward.
    #[inline]
    pub fn is_forward(self) -> bool {
        self == Direction::Forward
    }

    /// Human readable name.
    pub fn name(self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Reverse => "reverse",
        }
    }
}

impl From<bool> for Direction {
    fn from(forward: bool) -> Self {
        if forward {
            Direction::Forward
        } else {
            Direction::Reverse
        }
    }
}

/// Coarse controller phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Enable line deasserted, no pulses.
    Disabled,
    /// Enable line asserted, pulses generated at the current interval.
    Enabled,
}

/// Authoritative motor state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotorState {
    pub(crate) enabled: bool,
    pub(crate) direction: Direction,
    pub(crate) step_interval_us: u32,
    pub(crate) microstep: Microstep,
    pub(crate) pulses_per_revolution: u32,
    pub(crate) run_started_at: Instant,
    pub(crate) last_activity_at: Instant,
}

impl MotorState {
    /// Fresh state: disabled, forward, timestamps at `now`.
    pub(crate) fn new(
        step_interval_us: u32,
        microstep: Microstep,
        pulses_per_revolution: u32,
        now: Instant,
    ) -> Self {
        Self {
            enabled: false,
            direction: Direction::Forward,
            step_interval_us,
            microstep,
            pulses_per_revolution,
            run_started_at: now,
            last_activity_at: now,
        }
    }

    /// Whether the motor is enabled.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Current phase.
    #[inline]
    pub fn phase(&self) -> Phase {
        if self.enabled {
            Phase::Enabled
        } else {
            Phase::Disabled
        }
    }

    /// Current direction.
    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Current inter-pulse interval in microseconds.
    #[inline]
    pub fn step_interval_us(&self) -> u32 {
        self.step_interval_us
    }

    /// Active microstep resolution.
    #[inline]
    pub fn microstep(&self) -> Microstep {
        self.microstep
    }

    /// Pulses per output revolution at the active resolution.
    #[inline]
    pub fn pulses_per_revolution(&self) -> u32 {
        self.pulses_per_revolution
    }

    /// When the current run began.
    #[inline]
    pub fn run_started_at(&self) -> Instant {
        self.run_started_at
    }

    /// Last operator activity.
    #[inline]
    pub fn last_activity_at(&self) -> Instant {
        self.last_activity_at
    }

    /// Approximate output speed in revolutions per second.
    pub fn revolutions_per_sec(&self) -> f32 {
        let pulses_per_sec = 1_000_000.0 / self.step_interval_us as f32;
        pulses_per_sec / self.pulses_per_revolution as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_reversal() {
        assert_eq!(Direction::Forward.reversed(), Direction::Reverse);
        assert_eq!(Direction::Reverse.reversed(), Direction::Forward);
        assert_eq!(Direction::from(true), Direction::Forward);
    }

    #[test]
    fn test_revolutions_per_sec() {
        let state = MotorState::new(200, Microstep::Sixteenth, 3200, Instant(0));

        // 5000 pulses/s over 3200 pulses/rev
        assert!((state.revolutions_per_sec() - 1.5625).abs() < 0.0001);
        assert_eq!(state.phase(), Phase::Disabled);
    }
}
