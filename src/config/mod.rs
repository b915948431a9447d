//! Configuration module for stepper-arbiter.
//!
//! Provides types for loading and validating controller configuration
//! from TOML files (with `std` feature) or pre-parsed data.

mod motor;
mod system;
pub mod units;
#[cfg(feature = "std")]
mod loader;
mod validation;

pub use motor::MotorConfig;
pub use system::{BusConfig, ControllerConfig, WatchdogConfig, DEFAULT_RUN_DURATION_SECS};
pub use validation::{validate_config, validate_run_duration};

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};

// Re-export unit types at config level
pub use units::{Instant, Microstep};
