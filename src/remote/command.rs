//! Command and outcome values.

use crate::config::Microstep;
use crate::motion::SpeedAdjust;
use crate::motor::Direction;
use crate::storage::BrokerAddress;

use super::clients::{ClientName, DeviceId};

/// Where a command came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Source {
    /// Physical buttons.
    Button,
    /// Web API.
    Web,
    /// Message-bus subscriber.
    Bus,
    /// Safety watchdog.
    Watchdog,
}

impl Source {
    /// Commands from this source count as operator activity.
    #[inline]
    pub fn is_operator(self) -> bool {
        self != Source::Watchdog
    }

    /// Short name for log lines.
    pub fn name(self) -> &'static str {
        match self {
            Source::Button => "button",
            Source::Web => "web",
            Source::Bus => "bus",
            Source::Watchdog => "watchdog",
        }
    }
}

/// A request to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Enable the motor.
    Enable,
    /// Disable the motor.
    Disable,
    /// Toggle-button press; `limit_held` is the direction line held low.
    Toggle {
        /// Direction line was low when the press was committed.
        limit_held: bool,
    },
    /// Set the rotation direction.
    SetDirection(Direction),
    /// Reverse the rotation direction.
    ToggleDirection,
    /// Faster or slower.
    AdjustSpeed(SpeedAdjust),
    /// Emit one manual step pulse.
    StepOnce,
    /// Change microstep resolution (validated on execution).
    SetMicrostep(u16),
    /// Report the microstep resolution.
    GetMicrostep,
    /// Change the duration cutoff, in seconds (validated on execution).
    SetRunDuration(u32),
    /// Validate, persist and use a new broker address.
    SetBrokerAddress(BrokerAddress),
    /// Switch message-bus control on or off.
    SetRemoteControl(bool),
    /// Register a remote controller.
    RegisterClient(DeviceId),
    /// Assign a display name to a client.
    SetClientName(DeviceId, ClientName),
}

/// Effect of a motor state machine transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transition {
    /// Disabled → Enabled.
    Enabled,
    /// Enabled → Disabled.
    Disabled,
    /// Stayed enabled, direction reversed at a limit.
    Reversed(Direction),
    /// Nothing changed.
    Unchanged,
}

/// Result of an executed command.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Enable/disable/toggle result.
    Transition(Transition),
    /// Direction now in effect.
    Direction(Direction),
    /// Step interval now in effect, in microseconds.
    StepInterval(u32),
    /// One manual pulse emitted.
    Stepped,
    /// Microstep resolution in effect.
    Microstep(Microstep),
    /// Duration cutoff in effect, in seconds.
    RunDuration(u32),
    /// Broker address in effect.
    BrokerAddress(BrokerAddress),
    /// Message-bus control state.
    RemoteControl(bool),
    /// Client registered; `true` if it was not known before.
    ClientRegistered(bool),
    /// Client name stored.
    ClientNamed,
}

impl Outcome {
    /// Text published on the status topic, for outcomes that change motion.
    pub fn status_text(&self) -> Option<&'static str> {
        match self {
            Outcome::Transition(Transition::Enabled) => Some("Motor On"),
            Outcome::Transition(Transition::Disabled) => Some("Motor Off"),
            Outcome::Transition(Transition::Reversed(direction)) | Outcome::Direction(direction) => {
                Some(match direction {
                    Direction::Forward => "Motor Forward",
                    Direction::Reverse => "Motor Reverse",
                })
            }
            _ => None,
        }
    }
}
