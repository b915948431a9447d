//! Command surface shared by the button, web and message-bus sources.
//!
//! Every source produces the same [`Command`] value; the text parsers here
//! turn web requests and message-bus payloads into commands.

mod clients;
mod command;
mod parse;

pub use clients::{ClientName, ClientRegistry, DeviceId, DEFAULT_CLIENT_NAME, MAX_CLIENTS};
pub use command::{Command, Outcome, Source, Transition};
pub use parse::{parse_bus_message, parse_request};
