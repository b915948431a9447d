//! Motor module for stepper-arbiter.
//!
//! Provides the driver abstraction, the motor state machine and the
//! cooperative scheduler that arbitrates between command sources.

mod controller;
mod driver;
mod microstep;
pub mod state;
mod system;

pub use controller::MotorController;
pub use driver::{
    FixedResolution, ModePins, MotorDriver, ResolutionSelect, StepperDriver, PULSE_WIDTH_US,
};
pub use state::{Direction, MotorState, Phase};
pub use system::{MotorSystem, TickReport, COMMAND_QUEUE_LEN, STATUS_QUEUE_LEN};
