//! System configuration - root configuration structure.

use heapless::String;
use serde::Deserialize;

use super::motor::MotorConfig;

/// Default run duration before the duration cutoff fires, in seconds.
pub const DEFAULT_RUN_DURATION_SECS: u32 = 10;

/// Root configuration structure from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ControllerConfig {
    /// Motor and driver settings.
    #[serde(default)]
    pub motor: MotorConfig,

    /// Watchdog settings.
    #[serde(default)]
    pub watchdog: WatchdogConfig,

    /// Message-bus settings handed to the transport collaborator.
    #[serde(default)]
    pub bus: BusConfig,
}

/// Watchdog configuration (`[watchdog]` section).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WatchdogConfig {
    /// Maximum continuous run time in seconds (1-1800).
    pub run_duration_secs: u32,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            run_duration_secs: DEFAULT_RUN_DURATION_SECS,
        }
    }
}

/// Message-bus configuration (`[bus]` section).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Broker TCP port.
    pub broker_port: u16,

    /// Topic carrying motor control payloads.
    pub control_topic: String<32>,

    /// Topic status reports are published to.
    pub status_topic: String<32>,

    /// Topic whose messages trigger a single step.
    pub step_topic: String<32>,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            broker_port: 1883,
            control_topic: topic("motor/control"),
            status_topic: topic("motor/status"),
            step_topic: topic("motor/step_once"),
        }
    }
}

fn topic(name: &str) -> String<32> {
    String::try_from(name).unwrap_or_default()
}
