use tracing::warn;

/// # Steps
///
/// Work a driver should do for one frame.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Steps {
    /// Number of fixed ticks to process.
    pub ticks: u32,
    /// Milliseconds elapsed since the last processed tick.
    pub interpolation_ms: u32,
}

/// # Fixed Step
///
/// Turns variable frame times into a whole number of fixed ticks plus a sub-tick remainder.
#[derive(Clone, Debug)]
pub struct FixedStep {
    tick_ms: u32,
    max_ticks_per_frame: u32,
    accumulator_ms: u64,
}

impl FixedStep {
    /// Returns a clock with an empty accumulator. Zero arguments are raised to one.
    pub fn new(tick_ms: u32, max_ticks_per_frame: u32) -> Self {
        Self {
            tick_ms: tick_ms.max(1),
            max_ticks_per_frame: max_ticks_per_frame.max(1),
            accumulator_ms: 0,
        }
    }

    /// Returns the length of one tick in milliseconds.
    pub fn tick_ms(&self) -> u32 {
        self.tick_ms
    }

    /// Adds `elapsed_ms` to the accumulator and returns the ticks that fit. When more ticks are
    /// due than `max_ticks_per_frame`, the backlog beyond the cap is dropped.
    pub fn advance(&mut self, elapsed_ms: u32) -> Steps {
        let tick_ms = u64::from(self.tick_ms);
        self.accumulator_ms += u64::from(elapsed_ms);

        let due = self.accumulator_ms / tick_ms;
        let ticks = due.min(u64::from(self.max_ticks_per_frame));
        self.accumulator_ms -= ticks * tick_ms;

        if due > ticks {
            let dropped_ms = self.accumulator_ms - self.accumulator_ms % tick_ms;
            warn!(dropped_ms, due, ticks, "simulation behind, dropping backlog");
            self.accumulator_ms -= dropped_ms;
        }

        Steps {
            // Bounded by max_ticks_per_frame and by tick_ms respectively.
            ticks: ticks as u32,
            interpolation_ms: self.accumulator_ms as u32,
        }
    }

    /// Empties the accumulator.
    pub fn reset(&mut self) {
        self.accumulator_ms = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_less_than_tick_returns_no_ticks() {
        let mut clock = FixedStep::new(16, 5);

        let steps = clock.advance(10);

        assert_eq!(
            steps,
            Steps {
                ticks: 0,
                interpolation_ms: 10
            }
        );
    }

    #[test]
    fn advance_accumulates_across_frames() {
        let mut clock = FixedStep::new(16, 5);
        clock.advance(10);

        let steps = clock.advance(10);

        assert_eq!(
            steps,
            Steps {
                ticks: 1,
                interpolation_ms: 4
            }
        );
    }

    #[test]
    fn advance_multiple_ticks_catches_up() {
        let mut clock = FixedStep::new(10, 5);

        let steps = clock.advance(35);

        assert_eq!(
            steps,
            Steps {
                ticks: 3,
                interpolation_ms: 5
            }
        );
    }

    #[test]
    fn advance_over_cap_drops_backlog_keeps_remainder() {
        let mut clock = FixedStep::new(10, 2);

        let steps = clock.advance(57);

        assert_eq!(
            steps,
            Steps {
                ticks: 2,
                interpolation_ms: 7
            }
        );
        assert_eq!(clock.advance(0).ticks, 0);
    }

    #[test]
    fn advance_zero_returns_no_ticks() {
        let mut clock = FixedStep::new(16, 5);

        assert_eq!(clock.advance(0), Steps::default());
    }

    #[test]
    fn new_zero_tick_is_raised_to_one() {
        let clock = FixedStep::new(0, 0);

        assert_eq!(clock.tick_ms(), 1);
    }

    #[test]
    fn reset_clears_accumulator() {
        let mut clock = FixedStep::new(16, 5);
        clock.advance(12);

        clock.reset();

        assert_eq!(
            clock.advance(4),
            Steps {
                ticks: 0,
                interpolation_ms: 4
            }
        );
    }
}
