//! Persisted settings layout.
//!
//! | Offset | Size | Content |
//! |--------|------|---------|
//! | 0      | 100  | broker address, null-terminated ASCII |
//! | 200    | 1    | microstep mode (1, 8, 16 or 32) |
//!
//! Anything unreadable or unrecognized loads as the default.

use heapless::String;

use crate::config::Microstep;
use crate::error::{ConfigError, Error, Result};

use super::nvm::Nvm;

/// Size of the settings region in bytes.
pub const STORAGE_SIZE: usize = 512;

/// Offset of the broker address.
pub const ADDRESS_OFFSET: usize = 0;

/// Bytes reserved for the broker address, including the terminator.
pub const ADDRESS_MAX_LEN: usize = 100;

/// Offset of the microstep mode byte.
pub const MICROSTEP_OFFSET: usize = 200;

/// Broker address used when none is stored.
pub const DEFAULT_BROKER_ADDRESS: &str = "192.168.1.100";

/// Broker address text.
pub type BrokerAddress = String<ADDRESS_MAX_LEN>;

/// Typed access to the persisted settings.
#[derive(Debug)]
pub struct Settings<NVM: Nvm> {
    nvm: NVM,
}

impl<NVM: Nvm> Settings<NVM> {
    /// Wrap a storage device.
    pub fn new(nvm: NVM) -> Self {
        Self { nvm }
    }

    /// Stored microstep mode, if the byte holds a valid one.
    pub fn stored_microstep(&mut self) -> Option<Microstep> {
        let mut byte = [0u8; 1];
        if self.nvm.read(MICROSTEP_OFFSET, &mut byte).is_err() {
            warn!("microstep mode unreadable");
            return None;
        }

        let microstep = Microstep::from_byte(byte[0]);
        if microstep.is_none() {
            warn!("stored microstep byte {} invalid", byte[0]);
        }
        microstep
    }

    /// Load the microstep mode, defaulting to sixteenth stepping.
    pub fn load_microstep(&mut self) -> Microstep {
        self.stored_microstep().unwrap_or_default()
    }

    /// Persist the microstep mode.
    pub fn save_microstep(&mut self, microstep: Microstep) -> Result<()> {
        self.nvm.write(MICROSTEP_OFFSET, &[microstep as u8])?;
        self.nvm.commit()
    }

    /// Load the broker address, defaulting to [`DEFAULT_BROKER_ADDRESS`].
    pub fn load_broker_address(&mut self) -> BrokerAddress {
        let mut raw = [0u8; ADDRESS_MAX_LEN];
        if self.nvm.read(ADDRESS_OFFSET, &mut raw).is_err() {
            warn!("broker address unreadable, using default");
            return default_address();
        }

        let len = raw.iter().position(|&b| b == 0).unwrap_or(ADDRESS_MAX_LEN);
        let stored = core::str::from_utf8(&raw[..len])
            .ok()
            .and_then(|text| validate_address(text).ok());

        match stored {
            Some(address) => address,
            None => {
                debug!("no valid broker address stored, using default");
                default_address()
            }
        }
    }

    /// Validate and persist a broker address.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidAddress` for an empty, overlong or
    /// non-printable address; the stored value is left untouched.
    pub fn save_broker_address(&mut self, text: &str) -> Result<BrokerAddress> {
        let address = validate_address(text)?;

        let mut raw = [0u8; ADDRESS_MAX_LEN];
        raw[..address.len()].copy_from_slice(address.as_bytes());
        self.nvm.write(ADDRESS_OFFSET, &raw[..=address.len()])?;
        self.nvm.commit()?;

        info!("broker address saved: {}", address.as_str());
        Ok(address)
    }

    /// Access the storage device.
    pub fn nvm(&self) -> &NVM {
        &self.nvm
    }

    /// Release the storage device.
    pub fn release(self) -> NVM {
        self.nvm
    }
}

/// Check a broker address: 1-99 printable ASCII characters, no whitespace.
pub(crate) fn validate_address(text: &str) -> Result<BrokerAddress> {
    let text = text.trim();
    let printable = text.bytes().all(|b| b.is_ascii_graphic());
    if text.is_empty() || text.len() >= ADDRESS_MAX_LEN || !printable {
        return Err(Error::Config(ConfigError::InvalidAddress));
    }
    String::try_from(text).map_err(|_| Error::Config(ConfigError::InvalidAddress))
}

fn default_address() -> BrokerAddress {
    String::try_from(DEFAULT_BROKER_ADDRESS).unwrap_or_default()
}
