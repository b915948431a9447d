//! # stepper-arbiter
//!
//! Stepper motor control core arbitrating between a button pair, a web API and
//! a message-bus subscriber, with embedded-hal 1.0 support.
//!
//! ## Features
//!
//! - **Single owner**: one [`MotorController`] holds the motor state; every
//!   source produces the same [`Command`] value
//! - **Cooperative**: [`MotorSystem::tick`] takes an injected [`Instant`], no
//!   busy waiting and no globals
//! - **Safety cutoffs**: run-duration and inactivity watchdogs override every
//!   command source
//! - **Microstep aware**: per-mode minimum step intervals, DRV8825 mode pins,
//!   persisted selection
//! - **no_std compatible**: core library works without standard library
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stepper_arbiter::{ControllerConfig, MemoryNvm, MotorSystem, StepperDriver};
//!
//! // Load configuration from TOML
//! let config: ControllerConfig = stepper_arbiter::load_config("motor.toml")?;
//!
//! let driver = StepperDriver::new(step_pin, dir_pin, enable_pin, delay).configured(&config.motor);
//! let mut system = MotorSystem::new(driver, eeprom, toggle_pin, dir_button, &config, clock.now())?;
//!
//! loop {
//!     system.tick(clock.now());
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables file I/O and TOML parsing
//! - `alloc`: Enables heap allocation for no_std with allocator
//! - `defmt`: Enables defmt logging for embedded targets

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

#[cfg(feature = "alloc")]
extern crate alloc;

// Must come first so the logging macros are visible to the other modules.
#[macro_use]
mod fmt;

// Core modules
pub mod config;
pub mod error;
pub mod input;
pub mod motion;
pub mod motor;
pub mod remote;
pub mod storage;
pub mod watchdog;

// Re-exports for ergonomic API
pub use config::{validate_config, BusConfig, ControllerConfig, MotorConfig, WatchdogConfig};
pub use error::{Error, Result};
pub use input::{Button, Edge};
pub use motion::{PulseGenerator, SpeedAdjust};
pub use motor::{
    state, Direction, MotorController, MotorDriver, MotorState, MotorSystem, Phase, StepperDriver,
    TickReport,
};
pub use remote::{Command, Outcome, Source, Transition};
pub use storage::{MemoryNvm, Nvm};
pub use watchdog::{Watchdog, WatchdogTrip};

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};

// Unit types
pub use config::units::{Instant, Microstep};
