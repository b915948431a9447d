//! Motion module for stepper-arbiter.
//!
//! Provides non-blocking step pulse generation and speed adjustment.

mod pulse;
mod speed;

pub use pulse::PulseGenerator;
pub use speed::{adjust_speed, clamp_interval, SpeedAdjust, SPEED_STEP_US};

/// Slowest allowed inter-pulse interval, in microseconds.
pub const STEP_INTERVAL_MAX_US: u32 = 2000;

/// Fastest interval any microstep mode permits, in microseconds.
pub const STEP_INTERVAL_FLOOR_US: u32 = 50;
