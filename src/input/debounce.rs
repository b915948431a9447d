//! Level debouncing on raw pin samples.

use crate::config::Instant;

/// Time a raw level must stay unchanged before it is committed, in microseconds.
pub const DEBOUNCE_DELAY_US: u32 = 50_000;

/// Logic level of an input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    /// Line pulled low (button pressed).
    Low,
    /// Line high (button released).
    High,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Committed change of a button's stable level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    /// Stable level went low.
    Pressed,
    /// Stable level went high.
    Released,
}

/// Debounce state for one button.
///
/// Starts released. A raw change restarts the timer; the new level becomes
/// stable once it has been held for [`DEBOUNCE_DELAY_US`].
#[derive(Debug, Clone)]
pub struct Debouncer {
    stable: Level,
    raw: Level,
    last_change_at: Instant,
}

impl Debouncer {
    /// Create a debouncer in the released state.
    pub fn new(now: Instant) -> Self {
        Self {
            stable: Level::High,
            raw: Level::High,
            last_change_at: now,
        }
    }

    /// Feed one raw sample, returning an edge when a new level is committed.
    pub fn sample(&mut self, level: Level, now: Instant) -> Option<Edge> {
        if level != self.raw {
            self.raw = level;
            self.last_change_at = now;
            return None;
        }

        if level == self.stable || now.micros_since(self.last_change_at) < DEBOUNCE_DELAY_US {
            return None;
        }

        self.stable = level;
        Some(match level {
            Level::Low => Edge::Pressed,
            Level::High => Edge::Released,
        })
    }

    /// Most recent raw sample.
    #[inline]
    pub fn raw_level(&self) -> Level {
        self.raw
    }

    /// Committed level.
    #[inline]
    pub fn stable(&self) -> Level {
        self.stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ms(t: u32) -> Instant {
        Instant::from_millis(t)
    }

    #[test]
    fn test_press_committed_after_delay() {
        let mut d = Debouncer::new(ms(0));

        assert_eq!(d.sample(Level::Low, ms(10)), None);
        assert_eq!(d.sample(Level::Low, ms(59)), None);
        assert_eq!(d.sample(Level::Low, ms(60)), Some(Edge::Pressed));
        assert_eq!(d.sample(Level::Low, ms(500)), None);
        assert_eq!(d.stable(), Level::Low);

        assert_eq!(d.sample(Level::High, ms(600)), None);
        assert_eq!(d.sample(Level::High, ms(650)), Some(Edge::Released));
    }

    #[test]
    fn test_bounce_restarts_timer() {
        let mut d = Debouncer::new(ms(0));

        d.sample(Level::Low, ms(0));
        d.sample(Level::High, ms(30));
        d.sample(Level::Low, ms(45));
        assert_eq!(d.sample(Level::Low, ms(80)), None);
        assert_eq!(d.raw_level(), Level::Low);
        assert_eq!(d.sample(Level::Low, ms(95)), Some(Edge::Pressed));
    }

    #[test]
    fn test_glitch_back_to_stable_emits_nothing() {
        let mut d = Debouncer::new(ms(0));
        d.sample(Level::Low, ms(5));
        d.sample(Level::High, ms(8));
        assert_eq!(d.sample(Level::High, ms(200)), None);
        assert_eq!(d.stable(), Level::High);
    }

    #[test]
    fn test_debounce_across_timer_wrap() {
        let start = Instant(u32::MAX - 20_000);
        let mut d = Debouncer::new(start);
        d.sample(Level::Low, start);
        assert_eq!(d.sample(Level::Low, start.add_micros(49_999)), None);
        assert_eq!(d.sample(Level::Low, start.add_micros(50_000)), Some(Edge::Pressed));
    }

    proptest! {
        #[test]
        fn prop_burst_yields_at_most_one_edge(
            gaps in prop::collection::vec(1u32..50, 1..40),
            hold in 0u32..200,
        ) {
            let mut d = Debouncer::new(ms(0));
            let mut t = 0;
            let mut level = Level::Low;
            let mut edges = 0;

            for gap in gaps {
                t += gap;
                if d.sample(level, ms(t)).is_some() {
                    edges += 1;
                }
                level = if level == Level::Low { Level::High } else { Level::Low };
            }

            // Settle on the last level for a while.
            let last = if level == Level::Low { Level::High } else { Level::Low };
            for step in 0..=hold {
                if d.sample(last, ms(t + step)).is_some() {
                    edges += 1;
                }
            }

            prop_assert!(edges <= 1);
        }
    }
}
