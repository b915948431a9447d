//! Motor configuration from TOML.

use serde::Deserialize;

use super::units::Microstep;

/// Motor and driver configuration (`[motor]` section).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MotorConfig {
    /// Base steps per revolution (typically 200 for 1.8° motors).
    pub steps_per_revolution: u16,

    /// Inter-pulse interval at power-up, in microseconds.
    ///
    /// Clamped into the bounds of the active microstep mode.
    #[serde(rename = "step_interval_us")]
    pub default_step_interval_us: u32,

    /// Microstep mode used when durable storage holds no valid selection.
    pub microstep: Microstep,

    /// Invert direction pin logic.
    pub invert_direction: bool,

    /// Enable line is asserted by driving it low (A4988/DRV8825 `EN`).
    pub enable_active_low: bool,
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            steps_per_revolution: 200,
            default_step_interval_us: 200,
            microstep: Microstep::Sixteenth,
            invert_direction: false,
            enable_active_low: true,
        }
    }
}

impl MotorConfig {
    /// Pulses per output revolution at the given resolution.
    pub fn pulses_per_revolution(&self, microstep: Microstep) -> u32 {
        u32::from(self.steps_per_revolution) * u32::from(microstep.value())
    }
}
