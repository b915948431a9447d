//! Error types for stepper-arbiter.
//!
//! Provides unified error handling across configuration, command dispatch,
//! motor hardware access, and durable storage.

use core::fmt;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all stepper-arbiter operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Invalid parameter or configuration error
    Config(ConfigError),
    /// Command parsing or dispatch error
    Command(CommandError),
    /// Motor hardware error
    Motor(MotorError),
    /// Durable storage error
    Storage(StorageError),
}

/// Parameter and configuration errors.
///
/// Rejected at the boundary; the controller state is left unchanged.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Invalid microstep value (must be 1, 8, 16 or 32)
    InvalidMicrostep(u16),
    /// Run duration outside 1-1800 seconds
    InvalidRunDuration(u32),
    /// Step interval outside the allowed range
    InvalidStepInterval(u32),
    /// Steps per revolution must be > 0
    InvalidStepsPerRevolution(u16),
    /// Broker address is empty, too long, or not printable ASCII
    InvalidAddress,
    /// Client device identifier is empty or longer than 17 characters
    InvalidDeviceId,
    /// Client name is empty or longer than 32 characters
    InvalidClientName,
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Command parsing and dispatch errors.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandError {
    /// Unrecognized command text
    UnknownCommand(heapless::String<32>),
    /// A required argument was not supplied
    MissingArgument(&'static str),
    /// Pending command queue is full
    QueueFull,
    /// Message-bus commands arrive while remote control is switched off
    RemoteControlDisabled,
    /// Client registry has no free slot
    RegistryFull,
}

/// Motor hardware errors.
#[derive(Debug, Clone, PartialEq)]
pub enum MotorError {
    /// Pin operation failed
    PinError,
}

/// Durable storage errors.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageError {
    /// Access past the end of the storage region
    OutOfBounds {
        /// Start offset of the access
        offset: usize,
        /// Length of the access
        len: usize,
    },
    /// Underlying device reported a failure
    Device,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Command(e) => write!(f, "Command error: {}", e),
            Error::Motor(e) => write!(f, "Motor error: {}", e),
            Error::Storage(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::InvalidMicrostep(v) => {
                write!(f, "Invalid microstep mode: {}. Valid values: 1, 8, 16, 32", v)
            }
            ConfigError::InvalidRunDuration(v) => {
                write!(f, "Invalid run duration: {} s. Must be 1-1800", v)
            }
            ConfigError::InvalidStepInterval(v) => {
                write!(f, "Invalid step interval: {} us. Must be 50-2000", v)
            }
            ConfigError::InvalidStepsPerRevolution(v) => {
                write!(f, "Invalid steps per revolution: {}. Must be > 0", v)
            }
            ConfigError::InvalidAddress => write!(f, "Invalid broker address"),
            ConfigError::InvalidDeviceId => write!(f, "Invalid device id. Must be 1-17 characters"),
            ConfigError::InvalidClientName => {
                write!(f, "Invalid client name. Must be 1-32 characters")
            }
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::UnknownCommand(text) => write!(f, "Unknown command '{}'", text),
            CommandError::MissingArgument(name) => write!(f, "Missing argument '{}'", name),
            CommandError::QueueFull => write!(f, "Command queue is full"),
            CommandError::RemoteControlDisabled => write!(f, "Remote control is disabled"),
            CommandError::RegistryFull => write!(f, "Client registry is full"),
        }
    }
}

impl fmt::Display for MotorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotorError::PinError => write!(f, "GPIO pin operation failed"),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::OutOfBounds { offset, len } => {
                write!(f, "Access of {} bytes at offset {} is out of bounds", len, offset)
            }
            StorageError::Device => write!(f, "Storage device failure"),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Error::Command(e)
    }
}

impl From<MotorError> for Error {
    fn from(e: MotorError) -> Self {
        Error::Motor(e)
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Error::Storage(e)
    }
}

impl Error {
    /// Whether this is a rejected parameter (state is guaranteed unchanged).
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

/// Copy as much of `text` as fits, for error and log payloads.
pub(crate) fn truncated<const N: usize>(text: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in text.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for CommandError {}

#[cfg(feature = "std")]
impl std::error::Error for MotorError {}

#[cfg(feature = "std")]
impl std::error::Error for StorageError {}
