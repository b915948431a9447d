//! Debounced push-button input.
//!
//! Buttons are active-low: a pressed button pulls its line low.

mod button;
mod debounce;

pub use button::Button;
pub use debounce::{Debouncer, Edge, Level, DEBOUNCE_DELAY_US};
