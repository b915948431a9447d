//! Stepper driver hardware access.
//!
//! Generic over embedded-hal 1.0 pin types. The [`MotorDriver`] trait is the
//! seam between the controller logic and the STEP/DIR/EN lines.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::config::{Microstep, MotorConfig};
use crate::error::{MotorError, Result};

use super::state::Direction;

/// Step pulse high time and low time, in microseconds.
///
/// Comfortably above the A4988/DRV8825 minimum in every microstep mode.
pub const PULSE_WIDTH_US: u32 = 20;

/// Operations the controller needs from a step/direction driver.
pub trait MotorDriver {
    /// Assert (`true`) or deassert the enable line.
    fn set_enabled(&mut self, enabled: bool) -> Result<()>;

    /// Drive the direction line.
    fn set_direction(&mut self, direction: Direction) -> Result<()>;

    /// Emit one step pulse. Blocks for at most two pulse widths.
    fn pulse(&mut self) -> Result<()>;

    /// Reconfigure the driver's microstep resolution.
    fn set_resolution(&mut self, microstep: Microstep) -> Result<()>;
}

/// Selects the driver's microstep resolution in hardware.
pub trait ResolutionSelect {
    /// Apply the resolution.
    fn select(&mut self, microstep: Microstep) -> Result<()>;
}

/// Resolution strapped with jumpers; selecting is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedResolution;

impl ResolutionSelect for FixedResolution {
    fn select(&mut self, _microstep: Microstep) -> Result<()> {
        Ok(())
    }
}

/// Three mode pins wired to a DRV8825-style driver.
#[derive(Debug)]
pub struct ModePins<M0, M1, M2> {
    m0: M0,
    m1: M1,
    m2: M2,
}

impl<M0, M1, M2> ModePins<M0, M1, M2>
where
    M0: OutputPin,
    M1: OutputPin,
    M2: OutputPin,
{
    /// Wrap the MODE0/MODE1/MODE2 pins.
    pub fn new(m0: M0, m1: M1, m2: M2) -> Self {
        Self { m0, m1, m2 }
    }

    /// Pin levels (MODE0, MODE1, MODE2) for a resolution.
    pub fn levels(microstep: Microstep) -> (bool, bool, bool) {
        match microstep {
            Microstep::Full => (false, false, false),
            Microstep::Eighth => (true, true, false),
            Microstep::Sixteenth => (false, false, true),
            Microstep::ThirtySecond => (true, false, true),
        }
    }

    /// Release the pins.
    pub fn release(self) -> (M0, M1, M2) {
        (self.m0, self.m1, self.m2)
    }
}

impl<M0, M1, M2> ResolutionSelect for ModePins<M0, M1, M2>
where
    M0: OutputPin,
    M1: OutputPin,
    M2: OutputPin,
{
    fn select(&mut self, microstep: Microstep) -> Result<()> {
        let (l0, l1, l2) = Self::levels(microstep);
        write_level(&mut self.m0, l0)?;
        write_level(&mut self.m1, l1)?;
        write_level(&mut self.m2, l2)?;
        Ok(())
    }
}

fn write_level<P: OutputPin>(pin: &mut P, high: bool) -> Result<()> {
    if high {
        pin.set_high().map_err(|_| MotorError::PinError)?;
    } else {
        pin.set_low().map_err(|_| MotorError::PinError)?;
    }
    Ok(())
}

/// Step/direction/enable driver (A4988, DRV8825 and compatibles).
///
/// Generic over:
/// - `STEP`: STEP pin type (must implement `OutputPin`)
/// - `DIR`: DIR pin type (must implement `OutputPin`)
/// - `EN`: enable pin type (must implement `OutputPin`)
/// - `DELAY`: Delay provider for the pulse width (must implement `DelayNs`)
/// - `RES`: resolution selection (defaults to [`FixedResolution`])
pub struct StepperDriver<STEP, DIR, EN, DELAY, RES = FixedResolution>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    DELAY: DelayNs,
    RES: ResolutionSelect,
{
    step_pin: STEP,
    dir_pin: DIR,
    enable_pin: EN,
    delay: DELAY,
    resolution: RES,

    /// Whether direction pin logic is inverted.
    invert_direction: bool,

    /// Enable is asserted by driving the line low.
    enable_active_low: bool,

    /// Last written enable state (cached to avoid a pin write every tick).
    enable_asserted: Option<bool>,

    /// Last written direction.
    current_direction: Option<Direction>,
}

impl<STEP, DIR, EN, DELAY> StepperDriver<STEP, DIR, EN, DELAY, FixedResolution>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    DELAY: DelayNs,
{
    /// Create a driver with an active-low enable line and fixed resolution.
    pub fn new(step_pin: STEP, dir_pin: DIR, enable_pin: EN, delay: DELAY) -> Self {
        Self {
            step_pin,
            dir_pin,
            enable_pin,
            delay,
            resolution: FixedResolution,
            invert_direction: false,
            enable_active_low: true,
            enable_asserted: None,
            current_direction: None,
        }
    }
}

impl<STEP, DIR, EN, DELAY, RES> StepperDriver<STEP, DIR, EN, DELAY, RES>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    DELAY: DelayNs,
    RES: ResolutionSelect,
{
    /// Use a different resolution selector.
    pub fn with_resolution<R: ResolutionSelect>(
        self,
        resolution: R,
    ) -> StepperDriver<STEP, DIR, EN, DELAY, R> {
        StepperDriver {
            step_pin: self.step_pin,
            dir_pin: self.dir_pin,
            enable_pin: self.enable_pin,
            delay: self.delay,
            resolution,
            invert_direction: self.invert_direction,
            enable_active_low: self.enable_active_low,
            enable_asserted: self.enable_asserted,
            current_direction: self.current_direction,
        }
    }

    /// Invert direction pin logic.
    pub fn invert_direction(mut self, invert: bool) -> Self {
        self.invert_direction = invert;
        self
    }

    /// Set enable line polarity.
    pub fn enable_active_low(mut self, active_low: bool) -> Self {
        self.enable_active_low = active_low;
        self
    }

    /// Apply pin polarity from configuration.
    pub fn configured(self, config: &MotorConfig) -> Self {
        self.invert_direction(config.invert_direction)
            .enable_active_low(config.enable_active_low)
    }

    /// Whether the enable line was last driven to its asserted level.
    #[inline]
    pub fn is_enable_asserted(&self) -> bool {
        self.enable_asserted == Some(true)
    }

    /// Last direction written to the DIR line.
    #[inline]
    pub fn current_direction(&self) -> Option<Direction> {
        self.current_direction
    }

    /// Release the hardware resources.
    pub fn release(self) -> (STEP, DIR, EN, DELAY, RES) {
        (
            self.step_pin,
            self.dir_pin,
            self.enable_pin,
            self.delay,
            self.resolution,
        )
    }
}

impl<STEP, DIR, EN, DELAY, RES> MotorDriver for StepperDriver<STEP, DIR, EN, DELAY, RES>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
    DELAY: DelayNs,
    RES: ResolutionSelect,
{
    fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        if self.enable_asserted == Some(enabled) {
            return Ok(());
        }

        let pin_high = enabled != self.enable_active_low;
        write_level(&mut self.enable_pin, pin_high)?;

        self.enable_asserted = Some(enabled);
        Ok(())
    }

    fn set_direction(&mut self, direction: Direction) -> Result<()> {
        if self.current_direction == Some(direction) {
            return Ok(());
        }

        let pin_high = direction.is_forward() != self.invert_direction;
        write_level(&mut self.dir_pin, pin_high)?;

        self.current_direction = Some(direction);
        Ok(())
    }

    fn pulse(&mut self) -> Result<()> {
        self.step_pin.set_high().map_err(|_| MotorError::PinError)?;
        self.delay.delay_us(PULSE_WIDTH_US);
        self.step_pin.set_low().map_err(|_| MotorError::PinError)?;
        self.delay.delay_us(PULSE_WIDTH_US);
        Ok(())
    }

    fn set_resolution(&mut self, microstep: Microstep) -> Result<()> {
        self.resolution.select(microstep)
    }
}
