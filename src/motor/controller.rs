//! Motor state machine.
//!
//! [`MotorController`] is the single owner of [`MotorState`] and of the driver.
//! Every transition drives the hardware line first and only then records the
//! new state, so a failed pin write leaves both untouched.

use crate::config::{Instant, Microstep, MotorConfig};
use crate::error::Result;
use crate::motion::{self, clamp_interval, PulseGenerator, SpeedAdjust};
use crate::remote::{Source, Transition};
use crate::storage::{Nvm, Settings};

use super::driver::MotorDriver;
use super::microstep::apply_microstep;
use super::state::{Direction, MotorState};

/// Owns the motor state, the driver and the persisted settings.
///
/// Generic over:
/// - `D`: the step/direction driver
/// - `NVM`: durable storage for the microstep selection
pub struct MotorController<D, NVM>
where
    D: MotorDriver,
    NVM: Nvm,
{
    driver: D,
    settings: Settings<NVM>,
    state: MotorState,
    pulses: PulseGenerator,

    /// Base steps per revolution from configuration.
    steps_per_revolution: u16,
}

impl<D, NVM> MotorController<D, NVM>
where
    D: MotorDriver,
    NVM: Nvm,
{
    /// Create a controller: disabled, forward, persisted microstep mode.
    ///
    /// The microstep mode comes from storage, falling back to the configured
    /// one; the driver resolution is applied and the enable line deasserted
    /// before returning.
    pub fn new(mut driver: D, nvm: NVM, config: &MotorConfig, now: Instant) -> Result<Self> {
        let mut settings = Settings::new(nvm);
        let microstep = settings.stored_microstep().unwrap_or(config.microstep);

        driver.set_resolution(microstep)?;
        driver.set_enabled(false)?;
        driver.set_direction(Direction::Forward)?;

        let interval = clamp_interval(config.default_step_interval_us, microstep);
        let state = MotorState::new(
            interval,
            microstep,
            config.pulses_per_revolution(microstep),
            now,
        );

        info!(
            "motor ready: 1/{} stepping, interval {} us",
            microstep.value(),
            interval
        );

        Ok(Self {
            driver,
            settings,
            state,
            pulses: PulseGenerator::new(now),
            steps_per_revolution: config.steps_per_revolution,
        })
    }

    /// Enable the motor.
    ///
    /// Starts a new run when disabled. Enabling an enabled motor only counts
    /// as activity; the run start is kept.
    pub fn enable(&mut self, source: Source, now: Instant) -> Result<Transition> {
        self.touch(source, now);
        if self.state.enabled {
            return Ok(Transition::Unchanged);
        }

        self.driver.set_enabled(true)?;
        self.state.enabled = true;
        self.state.run_started_at = now;

        info!("motor enabled by {}", source.name());
        Ok(Transition::Enabled)
    }

    /// Disable the motor. Watchdog disables do not count as activity.
    pub fn disable(&mut self, source: Source, now: Instant) -> Result<Transition> {
        self.touch(source, now);
        if !self.state.enabled {
            return Ok(Transition::Unchanged);
        }

        self.driver.set_enabled(false)?;
        self.state.enabled = false;

        info!("motor disabled by {}", source.name());
        Ok(Transition::Disabled)
    }

    /// Toggle-button press.
    ///
    /// With the direction line held low (`limit_held`) an enabled motor
    /// reverses instead of stopping.
    pub fn toggle(&mut self, limit_held: bool, now: Instant) -> Result<Transition> {
        if !self.state.enabled {
            return self.enable(Source::Button, now);
        }

        if !limit_held {
            return self.disable(Source::Button, now);
        }

        let direction = self.set_direction(self.state.direction.reversed(), Source::Button, now)?;
        info!("limit reached, reversing to {}", direction.name());
        Ok(Transition::Reversed(direction))
    }

    /// Set the rotation direction, in any state.
    pub fn set_direction(
        &mut self,
        direction: Direction,
        source: Source,
        now: Instant,
    ) -> Result<Direction> {
        self.touch(source, now);
        self.driver.set_direction(direction)?;
        self.state.direction = direction;

        debug!("direction {} by {}", direction.name(), source.name());
        Ok(direction)
    }

    /// Reverse the rotation direction.
    pub fn toggle_direction(&mut self, source: Source, now: Instant) -> Result<Direction> {
        self.set_direction(self.state.direction.reversed(), source, now)
    }

    /// Emit one manual pulse regardless of the enable state.
    pub fn step_once(&mut self, source: Source, now: Instant) -> Result<()> {
        self.touch(source, now);
        self.driver.pulse()?;
        debug!("single step by {}", source.name());
        Ok(())
    }

    /// Faster or slower by one increment; returns the new interval.
    pub fn adjust_speed(&mut self, adjust: SpeedAdjust, source: Source, now: Instant) -> u32 {
        self.touch(source, now);
        let interval = motion::adjust_speed(&mut self.state, adjust);
        info!(
            "step interval {} us, {} rev/s",
            interval,
            self.state.revolutions_per_sec()
        );
        interval
    }

    /// Change the microstep resolution.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidMicrostep` for anything but 1, 8, 16 or 32;
    /// nothing is changed in that case.
    pub fn set_microstep(&mut self, value: u16, source: Source, now: Instant) -> Result<Microstep> {
        let microstep = Microstep::new(value)?;
        self.touch(source, now);

        self.driver.set_resolution(microstep)?;
        let interval = apply_microstep(&mut self.state, microstep, self.steps_per_revolution);
        self.settings.save_microstep(microstep)?;

        info!(
            "microstep 1/{}, {} pulses/rev, interval {} us",
            microstep.value(),
            self.state.pulses_per_revolution,
            interval
        );
        Ok(microstep)
    }

    /// Active microstep resolution.
    #[inline]
    pub fn microstep(&self) -> Microstep {
        self.state.microstep
    }

    /// Drive the enable line and emit a pulse if one is due.
    pub fn run_pulses(&mut self, now: Instant) -> Result<bool> {
        self.pulses.tick(now, &self.state, &mut self.driver)
    }

    /// Current motor state.
    #[inline]
    pub fn state(&self) -> &MotorState {
        &self.state
    }

    /// Pulse generator statistics.
    #[inline]
    pub fn pulse_generator(&self) -> &PulseGenerator {
        &self.pulses
    }

    /// Access the driver.
    #[inline]
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Persisted settings.
    pub fn settings(&mut self) -> &mut Settings<NVM> {
        &mut self.settings
    }

    /// Release the driver and storage.
    pub fn release(self) -> (D, NVM) {
        (self.driver, self.settings.release())
    }

    fn touch(&mut self, source: Source, now: Instant) {
        if source.is_operator() {
            self.state.last_activity_at = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigError, Error};
    use crate::motor::testing::RecordingDriver;
    use crate::storage::{MemoryNvm, MICROSTEP_OFFSET, STORAGE_SIZE};

    type Controller = MotorController<RecordingDriver, MemoryNvm<STORAGE_SIZE>>;

    fn controller() -> Controller {
        MotorController::new(
            RecordingDriver::default(),
            MemoryNvm::new(),
            &MotorConfig::default(),
            Instant(0),
        )
        .unwrap()
    }

    fn ms(t: u32) -> Instant {
        Instant::from_millis(t)
    }

    #[test]
    fn test_initial_state() {
        let c = controller();
        assert!(!c.state().is_enabled());
        assert_eq!(c.state().direction(), Direction::Forward);
        assert_eq!(c.microstep(), Microstep::Sixteenth);
        assert_eq!(c.state().step_interval_us(), 200);
        assert_eq!(c.driver().resolution, Some(Microstep::Sixteenth));
        assert!(!c.driver().enabled);
    }

    #[test]
    fn test_stored_microstep_wins_over_config() {
        let mut bytes = [0xFFu8; STORAGE_SIZE];
        bytes[MICROSTEP_OFFSET] = 1;
        let c = MotorController::new(
            RecordingDriver::default(),
            MemoryNvm::with_contents(bytes),
            &MotorConfig::default(),
            Instant(0),
        )
        .unwrap();

        assert_eq!(c.microstep(), Microstep::Full);
        // 200 us is below the full-step floor
        assert_eq!(c.state().step_interval_us(), 800);
        assert_eq!(c.state().pulses_per_revolution(), 200);
    }

    #[test]
    fn test_enable_twice_keeps_run_start() {
        let mut c = controller();
        assert_eq!(c.enable(Source::Web, ms(100)).unwrap(), Transition::Enabled);
        assert_eq!(c.enable(Source::Bus, ms(900)).unwrap(), Transition::Unchanged);

        assert!(c.state().is_enabled());
        assert_eq!(c.state().run_started_at(), ms(100));
        assert_eq!(c.state().last_activity_at(), ms(900));
        assert!(c.driver().enabled);
    }

    #[test]
    fn test_watchdog_disable_does_not_refresh_activity() {
        let mut c = controller();
        c.enable(Source::Web, ms(10)).unwrap();
        assert_eq!(c.disable(Source::Watchdog, ms(500)).unwrap(), Transition::Disabled);
        assert_eq!(c.state().last_activity_at(), ms(10));
        assert!(!c.driver().enabled);

        assert_eq!(c.disable(Source::Web, ms(600)).unwrap(), Transition::Unchanged);
        assert_eq!(c.state().last_activity_at(), ms(600));
    }

    #[test]
    fn test_toggle_with_and_without_limit() {
        let mut c = controller();
        assert_eq!(c.toggle(false, ms(0)).unwrap(), Transition::Enabled);

        assert_eq!(
            c.toggle(true, ms(10)).unwrap(),
            Transition::Reversed(Direction::Reverse)
        );
        assert!(c.state().is_enabled());
        assert_eq!(c.driver().direction, Some(Direction::Reverse));

        assert_eq!(c.toggle(false, ms(20)).unwrap(), Transition::Disabled);
        assert_eq!(c.state().direction(), Direction::Reverse);
    }

    #[test]
    fn test_step_once_while_disabled() {
        let mut c = controller();
        c.step_once(Source::Web, ms(1)).unwrap();
        assert_eq!(c.driver().pulses, 1);
        assert!(!c.state().is_enabled());
    }

    #[test]
    fn test_set_microstep_persists_and_reclamps() {
        let mut c = controller();
        for _ in 0..20 {
            c.adjust_speed(SpeedAdjust::Increase, Source::Button, ms(0));
        }
        assert_eq!(c.state().step_interval_us(), 100);

        assert_eq!(c.set_microstep(8, Source::Web, ms(5)).unwrap(), Microstep::Eighth);
        assert_eq!(c.state().step_interval_us(), 200);
        assert_eq!(c.state().pulses_per_revolution(), 1600);
        assert_eq!(c.driver().resolution, Some(Microstep::Eighth));

        let (_, nvm) = c.release();
        assert_eq!(nvm.as_bytes()[MICROSTEP_OFFSET], 8);
    }

    #[test]
    fn test_invalid_microstep_changes_nothing() {
        let mut c = controller();
        let before = c.state().clone();
        assert_eq!(
            c.set_microstep(4, Source::Web, ms(50)),
            Err(Error::Config(ConfigError::InvalidMicrostep(4)))
        );
        assert_eq!(c.state(), &before);
    }

    #[test]
    fn test_failed_pin_write_leaves_state() {
        let mut c = controller();
        c.driver.fail = true;
        assert!(c.enable(Source::Web, ms(1)).is_err());
        assert!(!c.state().is_enabled());
    }
}
