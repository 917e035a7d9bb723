//! Simulation clock.
//!
//! Tracks the tick counter and the simulated milliseconds elapsed. The
//! tick number starts at 0 and the first [`SimClock::advance`] moves it
//! to 1, so an agent's `last_tick` of 0 never collides with a real tick.

/// Errors that can occur during clock operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// The time step is negative or not a number.
    #[error("invalid time step: {dt_ms} ms")]
    InvalidDelta {
        /// The rejected step.
        dt_ms: f64,
    },
}

/// Tick counter and elapsed simulated time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimClock {
    tick: u64,
    elapsed_ms: f64,
}

impl SimClock {
    /// A clock at tick 0.
    pub const fn new() -> Self {
        Self {
            tick: 0,
            elapsed_ms: 0.0,
        }
    }

    /// The last tick started. 0 before the first step.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated milliseconds since the start.
    pub const fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    /// Start the next tick of `dt_ms`. Returns the new tick number.
    pub fn advance(&mut self, dt_ms: f64) -> Result<u64, ClockError> {
        if !dt_ms.is_finite() || dt_ms < 0.0 {
            return Err(ClockError::InvalidDelta { dt_ms });
        }
        self.tick = self.tick.checked_add(1).ok_or(ClockError::TickOverflow)?;
        self.elapsed_ms += dt_ms;
        Ok(self.tick)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn advance_counts_ticks_and_time() {
        let mut clock = SimClock::new();
        assert_eq!(clock.advance(16.0).unwrap(), 1);
        assert_eq!(clock.advance(16.0).unwrap(), 2);
        assert_eq!(clock.tick(), 2);
        assert!((clock.elapsed_ms() - 32.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_bad_delta() {
        let mut clock = SimClock::new();
        assert!(matches!(clock.advance(-1.0), Err(ClockError::InvalidDelta { .. })));
        assert!(clock.advance(f64::NAN).is_err());
        assert_eq!(clock.tick(), 0);
    }

    #[test]
    fn overflow_is_an_error() {
        let mut clock = SimClock {
            tick: u64::MAX,
            elapsed_ms: 0.0,
        };
        assert_eq!(clock.advance(1.0), Err(ClockError::TickOverflow));
    }
}
