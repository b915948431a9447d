//! Unit types for timing and driver resolution.
//!
//! Provides a wrapping microsecond timestamp and the validated microstep
//! resolution so raw integers do not leak through the API.

use serde::Deserialize;

use crate::error::ConfigError;

/// Monotonic timestamp in microseconds.
///
/// Wraps around after roughly 71 minutes like a hardware tick counter. Elapsed
/// time is always computed with wrapping subtraction, so a single wrap between
/// two samples is harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Instant(pub u32);

impl Instant {
    /// Create an instant from a raw microsecond counter value.
    #[inline]
    pub const fn from_micros(micros: u32) -> Self {
        Self(micros)
    }

    /// Create an instant from a millisecond counter value.
    #[inline]
    pub const fn from_millis(millis: u32) -> Self {
        Self(millis.wrapping_mul(1_000))
    }

    /// Get the raw microsecond value.
    #[inline]
    pub const fn as_micros(self) -> u32 {
        self.0
    }

    /// Microseconds elapsed since `earlier`.
    #[inline]
    pub const fn micros_since(self, earlier: Instant) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    /// Instant `micros` later, wrapping.
    #[inline]
    pub const fn add_micros(self, micros: u32) -> Self {
        Self(self.0.wrapping_add(micros))
    }

    /// Instant `millis` later, wrapping.
    #[inline]
    pub const fn add_millis(self, millis: u32) -> Self {
        self.add_micros(millis.wrapping_mul(1_000))
    }
}

/// Driver microstep resolution.
///
/// Only the four modes the controller can drive safely are representable.
/// Defaults to sixteenth stepping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Microstep {
    /// Full step (no microstepping).
    Full = 1,
    /// Eighth step.
    Eighth = 8,
    /// Sixteenth step.
    #[default]
    Sixteenth = 16,
    /// Thirty-second step.
    ThirtySecond = 32,
}

impl Microstep {
    /// All valid modes, coarsest first.
    pub const ALL: [Microstep; 4] = [
        Microstep::Full,
        Microstep::Eighth,
        Microstep::Sixteenth,
        Microstep::ThirtySecond,
    ];

    /// Create a microstep mode with validation.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidMicrostep` for anything but 1, 8, 16 or 32.
    pub fn new(value: u16) -> Result<Self, ConfigError> {
        match value {
            1 => Ok(Microstep::Full),
            8 => Ok(Microstep::Eighth),
            16 => Ok(Microstep::Sixteenth),
            32 => Ok(Microstep::ThirtySecond),
            other => Err(ConfigError::InvalidMicrostep(other)),
        }
    }

    /// Micro-steps per full mechanical step.
    #[inline]
    pub const fn value(self) -> u16 {
        self as u16
    }

    /// Smallest inter-pulse interval that does not lose steps at this resolution.
    #[inline]
    pub const fn min_step_interval_us(self) -> u32 {
        match self {
            Microstep::Full => 800,
            Microstep::Eighth => 200,
            Microstep::Sixteenth => 100,
            Microstep::ThirtySecond => 50,
        }
    }

    /// Decode a persisted byte.
    #[inline]
    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::new(u16::from(byte)).ok()
    }
}

impl TryFrom<u16> for Microstep {
    type Error = ConfigError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl<'de> Deserialize<'de> for Microstep {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use core::fmt::Write;
        let value = u16::deserialize(deserializer)?;
        Microstep::new(value).map_err(|e| {
            let mut buf = heapless::String::<128>::new();
            let _ = write!(buf, "{}", e);
            serde::de::Error::custom(buf.as_str())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_microstep_valid_values() {
        for m in Microstep::ALL {
            assert_eq!(Microstep::new(m.value()), Ok(m));
        }
    }

    #[test]
    fn test_microstep_invalid_values() {
        for v in [0, 2, 4, 12, 17, 64, 256] {
            assert_eq!(Microstep::new(v), Err(ConfigError::InvalidMicrostep(v)));
        }
    }

    #[test]
    fn test_min_interval_non_increasing() {
        let floors: Vec<u32> = Microstep::ALL
            .iter()
            .map(|m| m.min_step_interval_us())
            .collect();
        assert_eq!(floors, vec![800, 200, 100, 50]);
        assert!(floors.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_instant_wraps() {
        let before = Instant(u32::MAX - 9);
        let after = before.add_micros(20);
        assert_eq!(after.as_micros(), 10);
        assert_eq!(after.micros_since(before), 20);
    }
}
