//! Push-button on an embedded-hal input pin.

use embedded_hal::digital::InputPin;

use crate::config::Instant;
use crate::error::{MotorError, Result};

use super::debounce::{Debouncer, Edge, Level};

/// Debounced active-low push-button.
#[derive(Debug)]
pub struct Button<PIN: InputPin> {
    pin: PIN,
    debouncer: Debouncer,
}

impl<PIN: InputPin> Button<PIN> {
    /// Wrap an input pin; the button starts released.
    pub fn new(pin: PIN, now: Instant) -> Self {
        Self {
            pin,
            debouncer: Debouncer::new(now),
        }
    }

    /// Sample the pin once.
    ///
    /// # Errors
    ///
    /// Returns `MotorError::PinError` if the pin cannot be read.
    pub fn poll(&mut self, now: Instant) -> Result<Option<Edge>> {
        let high = self.pin.is_high().map_err(|_| MotorError::PinError)?;
        Ok(self.debouncer.sample(Level::from(high), now))
    }

    /// Whether the last raw sample was low, without debouncing.
    ///
    /// This is what the limit check reads: a held direction line counts as soon
    /// as it is seen.
    #[inline]
    pub fn is_raw_low(&self) -> bool {
        self.debouncer.raw_level() == Level::Low
    }

    /// Whether the debounced level is pressed.
    #[inline]
    pub fn is_pressed(&self) -> bool {
        self.debouncer.stable() == Level::Low
    }

    /// Release the pin.
    pub fn release(self) -> PIN {
        self.pin
    }
}
