//! Configuration validation.

use crate::error::{ConfigError, Error, Result};
use crate::motion::{STEP_INTERVAL_FLOOR_US, STEP_INTERVAL_MAX_US};

use super::ControllerConfig;

/// Longest accepted run duration, in seconds.
pub const MAX_RUN_DURATION_SECS: u32 = 1800;

/// Validate a controller configuration.
///
/// Checks:
/// - Steps per revolution is non-zero
/// - Default step interval lies within the driver's absolute bounds
/// - Run duration is 1-1800 seconds
pub fn validate_config(config: &ControllerConfig) -> Result<()> {
    if config.motor.steps_per_revolution == 0 {
        return Err(Error::Config(ConfigError::InvalidStepsPerRevolution(
            config.motor.steps_per_revolution,
        )));
    }

    let interval = config.motor.default_step_interval_us;
    if !(STEP_INTERVAL_FLOOR_US..=STEP_INTERVAL_MAX_US).contains(&interval) {
        return Err(Error::Config(ConfigError::InvalidStepInterval(interval)));
    }

    validate_run_duration(config.watchdog.run_duration_secs)?;

    Ok(())
}

/// Validate a run duration in seconds.
///
/// # Errors
///
/// Returns `ConfigError::InvalidRunDuration` outside 1-1800 seconds.
pub fn validate_run_duration(secs: u32) -> Result<()> {
    if secs == 0 || secs > MAX_RUN_DURATION_SECS {
        return Err(Error::Config(ConfigError::InvalidRunDuration(secs)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ControllerConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_steps_rejected() {
        let mut config = ControllerConfig::default();
        config.motor.steps_per_revolution = 0;

        let result = validate_config(&config);
        assert!(matches!(
            result,
            Err(Error::Config(ConfigError::InvalidStepsPerRevolution(0)))
        ));
    }

    #[test]
    fn test_step_interval_bounds() {
        let mut config = ControllerConfig::default();
        config.motor.default_step_interval_us = 49;
        assert!(validate_config(&config).is_err());

        config.motor.default_step_interval_us = 2001;
        assert!(validate_config(&config).is_err());

        config.motor.default_step_interval_us = 2000;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_run_duration_range() {
        assert!(validate_run_duration(0).is_err());
        assert!(validate_run_duration(1).is_ok());
        assert!(validate_run_duration(1800).is_ok());
        assert_eq!(
            validate_run_duration(1801),
            Err(Error::Config(ConfigError::InvalidRunDuration(1801)))
        );
    }
}
