//! Button panel simulation.
//!
//! Drives the control core with simulated buttons, a web request and a
//! message-bus message, printing the status reports a transport would publish.
//!
//! This example uses in-memory pins for running without real hardware.

use std::cell::Cell;
use std::rc::Rc;

use stepper_arbiter::{
    Command, ControllerConfig, Instant, MemoryNvm, MotorSystem, Source, StepperDriver,
};

/// Delay provider that does not wait.
struct MockDelay;

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

/// Output pin that only counts rising edges.
struct MockPin {
    rising: Rc<Cell<u32>>,
    high: bool,
}

impl MockPin {
    fn new(rising: Rc<Cell<u32>>) -> Self {
        Self {
            rising,
            high: false,
        }
    }
}

impl embedded_hal::digital::ErrorType for MockPin {
    type Error = core::convert::Infallible;
}

impl embedded_hal::digital::OutputPin for MockPin {
    fn set_high(&mut self) -> Result<(), Self::Error> {
        if !self.high {
            self.rising.set(self.rising.get() + 1);
        }
        self.high = true;
        Ok(())
    }

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high = false;
        Ok(())
    }
}

/// Push-button line; released is high.
#[derive(Clone)]
struct MockButton(Rc<Cell<bool>>);

impl embedded_hal::digital::ErrorType for MockButton {
    type Error = core::convert::Infallible;
}

impl embedded_hal::digital::InputPin for MockButton {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0.get())
    }
}

fn main() {
    println!("=== Button Panel Example ===\n");

    let config = ControllerConfig::default();
    let steps = Rc::new(Cell::new(0));
    let unused = Rc::new(Cell::new(0));

    let driver = StepperDriver::new(
        MockPin::new(steps.clone()),
        MockPin::new(unused.clone()),
        MockPin::new(unused),
        MockDelay,
    )
    .configured(&config.motor);

    let toggle = MockButton(Rc::new(Cell::new(true)));
    let limit = MockButton(Rc::new(Cell::new(true)));

    let mut system = MotorSystem::new(
        driver,
        MemoryNvm::<512>::new(),
        toggle.clone(),
        limit.clone(),
        &config,
        Instant(0),
    )
    .expect("valid configuration");

    system
        .execute(Source::Web, Command::SetRunDuration(3), Instant(0))
        .expect("duration in range");
    system
        .execute(Source::Web, Command::SetRemoteControl(true), Instant(0))
        .expect("remote control");

    // 5 seconds in 100 us ticks
    for tick in 0..50_000u32 {
        let now = Instant::from_micros(tick * 100);
        let ms = tick / 10;

        match ms {
            100 => toggle.0.set(false),
            300 => toggle.0.set(true),
            1_000 if tick % 10 == 0 => {
                system
                    .submit_request("motor-speed-up", &[])
                    .expect("queue has room");
            }
            1_500 => limit.0.set(false),
            1_600 => toggle.0.set(false),
            1_800 => {
                toggle.0.set(true);
                limit.0.set(true);
            }
            2_000 if tick % 10 == 0 => {
                system
                    .submit_bus("motor/control", b"forward")
                    .expect("queue has room");
            }
            _ => {}
        }

        let report = system.tick(now);
        if let Some(trip) = report.watchdog {
            println!("[{:>5} ms] watchdog: {:?}", ms, trip);
        }
        while let Some(text) = system.pop_status_report() {
            println!("[{:>5} ms] status: {}", ms, text);
        }
    }

    let state = system.state();
    println!("\nFinal state:");
    println!("  Enabled: {}", state.is_enabled());
    println!("  Direction: {}", state.direction().name());
    println!("  Interval: {} us", state.step_interval_us());
    println!("  Microstep: 1/{}", state.microstep().value());
    println!("  Step pulses: {}", steps.get());
}
