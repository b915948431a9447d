//! Durable storage for operator settings.
//!
//! Byte-addressed storage (EEPROM or emulated EEPROM) behind the [`Nvm`]
//! trait, and the fixed layout used to persist the broker address and the
//! microstep mode.

mod nvm;
mod settings;

pub use nvm::{MemoryNvm, Nvm};
pub use settings::{
    Settings, BrokerAddress, ADDRESS_MAX_LEN, ADDRESS_OFFSET, DEFAULT_BROKER_ADDRESS,
    MICROSTEP_OFFSET, STORAGE_SIZE,
};
