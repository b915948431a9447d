//! Registry of remote controllers.

use heapless::{FnvIndexMap, String};

use crate::error::{CommandError, Error, Result};

/// Maximum number of clients in the registry.
pub const MAX_CLIENTS: usize = 8;

/// Name given to a client registered without one.
pub const DEFAULT_CLIENT_NAME: &str = "default";

/// Device identifier (a MAC address in text form fits).
pub type DeviceId = String<17>;

/// Client display name.
pub type ClientName = String<32>;

/// Maps device identifiers to display names.
///
/// Entries never expire. Registering any client marks the remote controller
/// as online. Whether bus commands are accepted is decided elsewhere.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: FnvIndexMap<DeviceId, ClientName, MAX_CLIENTS>,
    online: bool,
}

impl ClientRegistry {
    /// Create an empty registry with the controller offline.
    pub fn new() -> Self {
        Self {
            clients: FnvIndexMap::new(),
            online: false,
        }
    }

    /// Register a client under the default name, keeping an existing name.
    ///
    /// Returns `true` if the client was not known before.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::RegistryFull` if there is no free slot.
    pub fn register(&mut self, device: &DeviceId) -> Result<bool> {
        let newly = !self.clients.contains_key(device);
        if newly {
            let name = String::try_from(DEFAULT_CLIENT_NAME).unwrap_or_default();
            self.clients
                .insert(device.clone(), name)
                .map_err(|_| Error::Command(CommandError::RegistryFull))?;
        }
        self.online = true;
        Ok(newly)
    }

    /// Insert or rename a client.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::RegistryFull` if the client is new and there is
    /// no free slot.
    pub fn set_name(&mut self, device: &DeviceId, name: &ClientName) -> Result<()> {
        self.clients
            .insert(device.clone(), name.clone())
            .map_err(|_| Error::Command(CommandError::RegistryFull))?;
        Ok(())
    }

    /// Display name of a client.
    pub fn name(&self, device: &str) -> Option<&str> {
        let key = DeviceId::try_from(device).ok()?;
        self.clients.get(&key).map(|n| n.as_str())
    }

    /// Whether a remote controller is online.
    #[inline]
    pub fn controller_online(&self) -> bool {
        self.online
    }

    /// Get the number of registered clients.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Get an iterator over (device, name) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.clients.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
