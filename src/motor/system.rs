//! Cooperative scheduler arbitrating between command sources.
//!
//! One [`MotorSystem::tick`] per main-loop iteration polls the buttons, lets
//! the watchdog evaluate its cutoffs, runs the pulse generator and drains
//! commands queued by the web and message-bus collaborators. There is no
//! source priority: the last command processed wins.

use embedded_hal::digital::InputPin;
use heapless::Deque;

use crate::config::{validate_config, BusConfig, ControllerConfig, Instant};
use crate::error::{CommandError, Error, Result};
use crate::input::{Button, Edge};
use crate::remote::{parse_bus_message, parse_request, ClientRegistry, Command, Outcome, Source};
use crate::storage::{BrokerAddress, Nvm};
use crate::watchdog::{Watchdog, WatchdogTrip};

use super::controller::MotorController;
use super::driver::MotorDriver;
use super::state::MotorState;

/// Capacity of the pending command queue.
pub const COMMAND_QUEUE_LEN: usize = 8;

/// Capacity of the status report outbox; the oldest report is dropped when full.
pub const STATUS_QUEUE_LEN: usize = 8;

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// A step pulse was emitted.
    pub pulsed: bool,
    /// The watchdog disabled the motor.
    pub watchdog: Option<WatchdogTrip>,
    /// Queued commands executed successfully.
    pub dispatched: u8,
    /// Queued commands rejected.
    pub rejected: u8,
    /// First hardware or storage failure seen during the tick.
    pub fault: Option<Error>,
}

impl TickReport {
    fn record_fault(&mut self, error: Error) {
        if self.fault.is_none() {
            self.fault = Some(error);
        }
    }
}

/// The motor control core: one controller, two buttons, the watchdog and
/// the remote command surface.
///
/// Generic over:
/// - `D`: step/direction driver
/// - `NVM`: durable storage
/// - `TB`: toggle button input pin
/// - `DB`: direction button input pin (also the limit line)
///
/// # Example
///
/// ```rust,ignore
/// use stepper_arbiter::{ControllerConfig, MotorSystem, Source, Command};
///
/// let mut system = MotorSystem::new(driver, nvm, toggle_pin, dir_pin, &config, now)?;
///
/// loop {
///     let report = system.tick(clock.now());
///     while let Some(text) = system.pop_status_report() {
///         mqtt.publish(&config.bus.status_topic, text);
///     }
/// }
/// ```
pub struct MotorSystem<D, NVM, TB, DB>
where
    D: MotorDriver,
    NVM: Nvm,
    TB: InputPin,
    DB: InputPin,
{
    controller: MotorController<D, NVM>,
    watchdog: Watchdog,
    toggle_button: Button<TB>,
    direction_button: Button<DB>,
    clients: ClientRegistry,
    remote_control: bool,
    bus: BusConfig,
    broker_address: BrokerAddress,
    pending: Deque<(Source, Command), COMMAND_QUEUE_LEN>,
    status: Deque<&'static str, STATUS_QUEUE_LEN>,
}

impl<D, NVM, TB, DB> MotorSystem<D, NVM, TB, DB>
where
    D: MotorDriver,
    NVM: Nvm,
    TB: InputPin,
    DB: InputPin,
{
    /// Build the system from validated configuration.
    ///
    /// The motor starts disabled and facing forward; the microstep mode and
    /// broker address come from storage.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for invalid configuration, or a motor error if
    /// the initial pin writes fail.
    pub fn new(
        driver: D,
        nvm: NVM,
        toggle_pin: TB,
        direction_pin: DB,
        config: &ControllerConfig,
        now: Instant,
    ) -> Result<Self> {
        validate_config(config)?;

        let mut controller = MotorController::new(driver, nvm, &config.motor, now)?;
        let broker_address = controller.settings().load_broker_address();

        Ok(Self {
            controller,
            watchdog: Watchdog::from_config(&config.watchdog)?,
            toggle_button: Button::new(toggle_pin, now),
            direction_button: Button::new(direction_pin, now),
            clients: ClientRegistry::new(),
            remote_control: false,
            bus: config.bus.clone(),
            broker_address,
            pending: Deque::new(),
            status: Deque::new(),
        })
    }

    /// Run one scheduling step.
    ///
    /// Failures are recorded in the report and never stop the remaining
    /// stages, so the watchdog is evaluated on every tick.
    pub fn tick(&mut self, now: Instant) -> TickReport {
        let mut report = TickReport::default();

        self.poll_buttons(now, &mut report);

        if let Some(trip) = self.watchdog.check(self.controller.state(), now) {
            match trip {
                WatchdogTrip::RunDuration => warn!("run duration reached, stopping motor"),
                WatchdogTrip::Inactivity => warn!("no activity, stopping motor"),
            }
            match self.controller.disable(Source::Watchdog, now) {
                Ok(transition) => {
                    self.publish(&Outcome::Transition(transition));
                    report.watchdog = Some(trip);
                }
                Err(e) => report.record_fault(e),
            }
        }

        match self.controller.run_pulses(now) {
            Ok(pulsed) => report.pulsed = pulsed,
            Err(e) => report.record_fault(e),
        }

        while let Some((source, command)) = self.pending.pop_front() {
            match self.execute(source, command, now) {
                Ok(_) => report.dispatched += 1,
                Err(e) => {
                    report.rejected += 1;
                    if !e.is_invalid_parameter() && !matches!(e, Error::Command(_)) {
                        report.record_fault(e);
                    }
                }
            }
        }

        report
    }

    /// Execute a command immediately.
    ///
    /// Message-bus commands are rejected while remote control is off.
    /// Registering a client does not switch it on.
    pub fn execute(&mut self, source: Source, command: Command, now: Instant) -> Result<Outcome> {
        if source == Source::Bus && !self.remote_control {
            debug!("bus command ignored, remote control off");
            return Err(CommandError::RemoteControlDisabled.into());
        }

        let result = self.dispatch(source, command, now);
        match &result {
            Ok(outcome) => self.publish(outcome),
            Err(_) => warn!("{} command rejected", source.name()),
        }
        result
    }

    /// Queue a command for the next tick.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::QueueFull` when [`COMMAND_QUEUE_LEN`] commands
    /// are already pending.
    pub fn submit(&mut self, source: Source, command: Command) -> Result<()> {
        self.pending
            .push_back((source, command))
            .map_err(|_| Error::Command(CommandError::QueueFull))
    }

    /// Parse and queue a web request.
    ///
    /// A request that does not parse is logged and nothing is queued.
    pub fn submit_request(&mut self, operation: &str, query: &[(&str, &str)]) -> Result<()> {
        let command = parse_request(operation, query).map_err(|e| {
            warn!("web request {} ignored", operation);
            e
        })?;
        self.submit(Source::Web, command)
    }

    /// Parse and queue a message-bus message.
    ///
    /// A message that does not parse is logged and nothing is queued.
    pub fn submit_bus(&mut self, topic: &str, payload: &[u8]) -> Result<()> {
        let command = parse_bus_message(topic, payload, &self.bus).map_err(|e| {
            warn!("bus message on {} ignored", topic);
            e
        })?;
        self.submit(Source::Bus, command)
    }

    /// Next status text to publish on the status topic.
    pub fn pop_status_report(&mut self) -> Option<&'static str> {
        self.status.pop_front()
    }

    /// Current motor state.
    #[inline]
    pub fn state(&self) -> &MotorState {
        self.controller.state()
    }

    /// The motor controller.
    #[inline]
    pub fn controller(&self) -> &MotorController<D, NVM> {
        &self.controller
    }

    /// The watchdog.
    #[inline]
    pub fn watchdog(&self) -> &Watchdog {
        &self.watchdog
    }

    /// Registered remote clients.
    #[inline]
    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    /// Whether message-bus commands are accepted.
    #[inline]
    pub fn remote_control(&self) -> bool {
        self.remote_control
    }

    /// Message-bus settings.
    #[inline]
    pub fn bus_config(&self) -> &BusConfig {
        &self.bus
    }

    /// Broker address in effect.
    pub fn broker_address(&self) -> &str {
        self.broker_address.as_str()
    }

    /// Number of queued commands.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn poll_buttons(&mut self, now: Instant, report: &mut TickReport) {
        let toggle = match self.toggle_button.poll(now) {
            Ok(edge) => edge,
            Err(e) => {
                report.record_fault(e);
                None
            }
        };
        let direction = match self.direction_button.poll(now) {
            Ok(edge) => edge,
            Err(e) => {
                report.record_fault(e);
                None
            }
        };

        if toggle == Some(Edge::Pressed) {
            let limit_held = self.direction_button.is_raw_low();
            if let Err(e) = self.execute(Source::Button, Command::Toggle { limit_held }, now) {
                report.record_fault(e);
            }
        }

        if direction == Some(Edge::Pressed) {
            if let Err(e) = self.execute(Source::Button, Command::ToggleDirection, now) {
                report.record_fault(e);
            }
        }
    }

    fn dispatch(&mut self, source: Source, command: Command, now: Instant) -> Result<Outcome> {
        let c = &mut self.controller;
        let outcome = match command {
            Command::Enable => Outcome::Transition(c.enable(source, now)?),
            Command::Disable => Outcome::Transition(c.disable(source, now)?),
            Command::Toggle { limit_held } => Outcome::Transition(c.toggle(limit_held, now)?),
            Command::SetDirection(direction) => {
                Outcome::Direction(c.set_direction(direction, source, now)?)
            }
            Command::ToggleDirection => Outcome::Direction(c.toggle_direction(source, now)?),
            Command::AdjustSpeed(adjust) => {
                Outcome::StepInterval(c.adjust_speed(adjust, source, now))
            }
            Command::StepOnce => {
                c.step_once(source, now)?;
                Outcome::Stepped
            }
            Command::SetMicrostep(value) => Outcome::Microstep(c.set_microstep(value, source, now)?),
            Command::GetMicrostep => Outcome::Microstep(c.microstep()),
            Command::SetRunDuration(secs) => {
                self.watchdog.set_run_duration(secs)?;
                info!("run duration set to {} s", secs);
                Outcome::RunDuration(secs)
            }
            Command::SetBrokerAddress(address) => {
                let saved = c.settings().save_broker_address(address.as_str())?;
                self.broker_address = saved.clone();
                Outcome::BrokerAddress(saved)
            }
            Command::SetRemoteControl(enabled) => {
                self.remote_control = enabled;
                info!("remote control {}", if enabled { "on" } else { "off" });
                Outcome::RemoteControl(enabled)
            }
            Command::RegisterClient(device) => {
                Outcome::ClientRegistered(self.clients.register(&device)?)
            }
            Command::SetClientName(device, name) => {
                self.clients.set_name(&device, &name)?;
                Outcome::ClientNamed
            }
        };
        Ok(outcome)
    }

    fn publish(&mut self, outcome: &Outcome) {
        let Some(text) = outcome.status_text() else {
            return;
        };
        if self.status.is_full() {
            self.status.pop_front();
        }
        let _ = self.status.push_back(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Microstep;
    use crate::error::ConfigError;
    use crate::motor::testing::RecordingDriver;
    use crate::motor::Direction;
    use crate::remote::{DeviceId, Transition};
    use crate::storage::{MemoryNvm, STORAGE_SIZE};
    use core::convert::Infallible;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Input line shared with the test body.
    #[derive(Clone, Default)]
    struct Line(Rc<Cell<bool>>);

    impl Line {
        fn released() -> Self {
            let line = Self::default();
            line.0.set(true);
            line
        }

        fn set_low(&self, low: bool) {
            self.0.set(!low);
        }
    }

    impl embedded_hal::digital::ErrorType for Line {
        type Error = Infallible;
    }

    impl InputPin for Line {
        fn is_high(&mut self) -> core::result::Result<bool, Infallible> {
            Ok(self.0.get())
        }

        fn is_low(&mut self) -> core::result::Result<bool, Infallible> {
            Ok(!self.0.get())
        }
    }

    type System = MotorSystem<RecordingDriver, MemoryNvm<STORAGE_SIZE>, Line, Line>;

    fn system() -> (System, Line, Line) {
        let toggle = Line::released();
        let direction = Line::released();
        let system = MotorSystem::new(
            RecordingDriver::default(),
            MemoryNvm::new(),
            toggle.clone(),
            direction.clone(),
            &ControllerConfig::default(),
            Instant(0),
        )
        .unwrap();
        (system, toggle, direction)
    }

    fn ms(t: u32) -> Instant {
        Instant::from_millis(t)
    }

    /// Hold the toggle button long enough to commit the press, then release.
    fn press_toggle(system: &mut System, toggle: &Line, at: u32) {
        toggle.set_low(true);
        system.tick(ms(at));
        system.tick(ms(at + 60));
        toggle.set_low(false);
        system.tick(ms(at + 100));
        system.tick(ms(at + 160));
    }

    #[test]
    fn test_toggle_button_enables_and_disables() {
        let (mut system, toggle, _) = system();

        press_toggle(&mut system, &toggle, 0);
        assert!(system.state().is_enabled());
        assert_eq!(system.pop_status_report(), Some("Motor On"));

        press_toggle(&mut system, &toggle, 1_000);
        assert!(!system.state().is_enabled());
        assert_eq!(system.pop_status_report(), Some("Motor Off"));
    }

    #[test]
    fn test_limit_held_reverses_instead_of_stopping() {
        let (mut system, toggle, direction) = system();
        press_toggle(&mut system, &toggle, 0);

        // Direction button press commits on its own and reverses.
        direction.set_low(true);
        system.tick(ms(500));
        system.tick(ms(560));
        assert_eq!(system.state().direction(), Direction::Reverse);

        // Line still held: the toggle press reverses instead of stopping.
        press_toggle(&mut system, &toggle, 1_000);
        assert!(system.state().is_enabled());
        assert_eq!(system.state().direction(), Direction::Forward);

        direction.set_low(false);
        system.tick(ms(2_000));
        system.tick(ms(2_060));
        press_toggle(&mut system, &toggle, 3_000);
        assert!(!system.state().is_enabled());
    }

    #[test]
    fn test_watchdog_runs_every_tick() {
        let (mut system, _, _) = system();
        system.execute(Source::Web, Command::SetRunDuration(2), ms(0)).unwrap();
        system.execute(Source::Web, Command::Enable, ms(0)).unwrap();

        assert_eq!(system.tick(ms(1_999)).watchdog, None);
        assert!(system.state().is_enabled());

        let report = system.tick(ms(2_000));
        assert_eq!(report.watchdog, Some(WatchdogTrip::RunDuration));
        assert!(!system.state().is_enabled());
        assert!(!system.controller().driver().enabled);
    }

    #[test]
    fn test_queue_is_fifo_and_bounded() {
        let (mut system, _, _) = system();
        system.submit(Source::Web, Command::Enable).unwrap();
        system
            .submit(Source::Web, Command::SetDirection(Direction::Reverse))
            .unwrap();
        system.submit(Source::Web, Command::Disable).unwrap();
        for _ in 3..COMMAND_QUEUE_LEN {
            system.submit(Source::Web, Command::GetMicrostep).unwrap();
        }
        assert_eq!(
            system.submit(Source::Web, Command::Enable),
            Err(Error::Command(CommandError::QueueFull))
        );

        let report = system.tick(ms(1));
        assert_eq!(usize::from(report.dispatched), COMMAND_QUEUE_LEN);
        assert_eq!(system.pending(), 0);
        assert!(!system.state().is_enabled());
        assert_eq!(system.state().direction(), Direction::Reverse);

        assert_eq!(system.pop_status_report(), Some("Motor On"));
        assert_eq!(system.pop_status_report(), Some("Motor Reverse"));
        assert_eq!(system.pop_status_report(), Some("Motor Off"));
        assert_eq!(system.pop_status_report(), None);
    }

    #[test]
    fn test_bus_gated_by_remote_control() {
        let (mut system, _, _) = system();
        assert_eq!(
            system.execute(Source::Bus, Command::Enable, ms(0)),
            Err(Error::Command(CommandError::RemoteControlDisabled))
        );

        system
            .execute(Source::Web, Command::SetRemoteControl(true), ms(0))
            .unwrap();
        assert!(system.remote_control());
        assert_eq!(
            system.execute(Source::Bus, Command::Enable, ms(1)),
            Ok(Outcome::Transition(Transition::Enabled))
        );

        system
            .execute(Source::Web, Command::SetRemoteControl(false), ms(2))
            .unwrap();
        system.submit_bus("motor/control", b"off").unwrap();
        let report = system.tick(ms(3));
        assert_eq!(report.rejected, 1);
        assert_eq!(report.fault, None);
        assert!(system.state().is_enabled());
    }

    #[test]
    fn test_registration_does_not_reopen_bus() {
        let (mut system, _, _) = system();
        system
            .submit_request("remote-control", &[("enable", "false")])
            .unwrap();
        system
            .submit_request("register-client", &[("device", "AA:BB:CC:DD:EE:FF")])
            .unwrap();
        system.submit_bus("motor/control", b"on").unwrap();

        let report = system.tick(ms(0));
        assert_eq!((report.dispatched, report.rejected), (2, 1));
        assert!(system.clients().controller_online());
        assert!(!system.remote_control());
        assert!(!system.state().is_enabled());
        assert!(!system.controller().driver().enabled);

        let device = DeviceId::try_from("AA:BB:CC:DD:EE:FF").unwrap();
        system
            .execute(Source::Web, Command::RegisterClient(device), ms(1))
            .unwrap();
        assert_eq!(
            system.execute(Source::Bus, Command::Enable, ms(1)),
            Err(Error::Command(CommandError::RemoteControlDisabled))
        );
    }

    #[test]
    fn test_unparsable_input_queues_nothing() {
        let (mut system, _, _) = system();
        system.submit(Source::Web, Command::GetMicrostep).unwrap();

        assert!(matches!(
            system.submit_request("motor-launch", &[]),
            Err(Error::Command(CommandError::UnknownCommand(_)))
        ));
        assert!(matches!(
            system.submit_bus("motor/control", b"spin"),
            Err(Error::Command(CommandError::UnknownCommand(_)))
        ));
        assert!(matches!(
            system.submit_bus("motor/other", b"on"),
            Err(Error::Command(CommandError::UnknownCommand(_)))
        ));
        assert_eq!(system.pending(), 1);

        let report = system.tick(ms(0));
        assert_eq!((report.dispatched, report.rejected), (1, 0));
        assert!(!system.state().is_enabled());
    }

    #[test]
    fn test_web_requests() {
        let (mut system, _, _) = system();
        system.submit_request("set-microstep", &[("mode", "32")]).unwrap();
        system.submit_request("set-microstep", &[("mode", "3")]).unwrap();
        let report = system.tick(ms(0));
        assert_eq!((report.dispatched, report.rejected), (1, 1));
        assert_eq!(system.controller().microstep(), Microstep::ThirtySecond);

        assert_eq!(
            system.execute(Source::Web, Command::SetRunDuration(3600), ms(1)),
            Err(Error::Config(ConfigError::InvalidRunDuration(3600)))
        );
        assert_eq!(system.watchdog().run_duration_secs(), 10);
    }

    #[test]
    fn test_broker_address_persisted() {
        let (mut system, _, _) = system();
        assert_eq!(system.broker_address(), "192.168.1.100");

        system
            .submit_request("set-broker-address", &[("address", "10.1.2.3")])
            .unwrap();
        system.tick(ms(0));
        assert_eq!(system.broker_address(), "10.1.2.3");
    }
}
