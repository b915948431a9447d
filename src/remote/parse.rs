//! Text parsers for web requests and message-bus payloads.

use heapless::String;

use crate::config::BusConfig;
use crate::error::{truncated, CommandError, ConfigError, Error, Result};
use crate::motion::SpeedAdjust;
use crate::motor::Direction;
use crate::storage::BrokerAddress;

use super::clients::{ClientName, DeviceId};
use super::command::Command;

/// Parse a web API request.
///
/// `operation` is the route name (`motor-on`, `set-microstep`, ...) and
/// `query` holds the request arguments as name/value pairs.
///
/// # Errors
///
/// - `CommandError::UnknownCommand` for an unrecognized operation or
///   sub-command
/// - `CommandError::MissingArgument` if a required argument is absent
/// - `ConfigError` for malformed numeric or address arguments, and for
///   client ids or names that are empty or too long
pub fn parse_request(operation: &str, query: &[(&str, &str)]) -> Result<Command> {
    let command = match operation {
        "motor-on" => Command::Enable,
        "motor-off" => Command::Disable,
        "motor-toggle-direction" => Command::ToggleDirection,
        "motor-speed-up" => Command::AdjustSpeed(SpeedAdjust::Increase),
        "motor-slow-down" => Command::AdjustSpeed(SpeedAdjust::Decrease),
        "motor-step-once" => Command::StepOnce,
        "get-microstep" => Command::GetMicrostep,
        "set-microstep" => {
            let mode = arg(query, "mode")?;
            let value = mode
                .trim()
                .parse::<u16>()
                .map_err(|_| Error::Config(ConfigError::InvalidMicrostep(0)))?;
            Command::SetMicrostep(value)
        }
        "set-run-duration" => {
            let secs = arg(query, "seconds")?;
            let value = secs
                .trim()
                .parse::<u32>()
                .map_err(|_| Error::Config(ConfigError::InvalidRunDuration(0)))?;
            Command::SetRunDuration(value)
        }
        "motor" => match arg(query, "command")? {
            "on" => Command::Enable,
            "off" => Command::Disable,
            "forward" => Command::SetDirection(Direction::Forward),
            "reverse" => Command::SetDirection(Direction::Reverse),
            other => return Err(unknown(other)),
        },
        "set-broker-address" => {
            let address = arg(query, "address")?;
            let address = BrokerAddress::try_from(address.trim())
                .map_err(|_| Error::Config(ConfigError::InvalidAddress))?;
            Command::SetBrokerAddress(address)
        }
        "remote-control" => match arg(query, "enable")? {
            "true" => Command::SetRemoteControl(true),
            "false" => Command::SetRemoteControl(false),
            other => return Err(unknown(other)),
        },
        "register-client" => Command::RegisterClient(device_id(arg(query, "device")?)?),
        "set-client-name" => {
            let device = device_id(arg(query, "device")?)?;
            let name = client_name(arg(query, "name")?)?;
            Command::SetClientName(device, name)
        }
        other => return Err(unknown(other)),
    };

    Ok(command)
}

/// Parse a message-bus message.
///
/// On the control topic the payload is one of `on`, `off`, `forward`,
/// `reverse` or `step_once`. Any message on the step topic is a single step.
///
/// # Errors
///
/// Returns `CommandError::UnknownCommand` for an unrecognized payload or topic.
pub fn parse_bus_message(topic: &str, payload: &[u8], bus: &BusConfig) -> Result<Command> {
    if topic == bus.step_topic.as_str() {
        return Ok(Command::StepOnce);
    }

    if topic != bus.control_topic.as_str() {
        return Err(unknown(topic));
    }

    let text = core::str::from_utf8(payload)
        .map_err(|_| unknown("<binary payload>"))?
        .trim();

    match text {
        "on" => Ok(Command::Enable),
        "off" => Ok(Command::Disable),
        "forward" => Ok(Command::SetDirection(Direction::Forward)),
        "reverse" => Ok(Command::SetDirection(Direction::Reverse)),
        "step_once" => Ok(Command::StepOnce),
        other => Err(unknown(other)),
    }
}

fn arg<'a>(query: &[(&str, &'a str)], name: &'static str) -> Result<&'a str> {
    query
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, value)| *value)
        .ok_or(Error::Command(CommandError::MissingArgument(name)))
}

fn unknown(text: &str) -> Error {
    Error::Command(CommandError::UnknownCommand(truncated(text)))
}

fn device_id(text: &str) -> Result<DeviceId> {
    non_empty(text).ok_or(Error::Config(ConfigError::InvalidDeviceId))
}

fn client_name(text: &str) -> Result<ClientName> {
    non_empty(text).ok_or(Error::Config(ConfigError::InvalidClientName))
}

/// Trimmed `text` if it is not empty and fits without cutting.
fn non_empty<const N: usize>(text: &str) -> Option<String<N>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    String::try_from(text).ok()
}
