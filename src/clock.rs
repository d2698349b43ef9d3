//! Wall-clock timing for driving the run loop

use std::time::{Duration, Instant};
use tracing::debug;

/// Monotonic millisecond clock
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    start: Instant,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    /// Start counting from now
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Milliseconds since the clock was created
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

/// Turns successive clock readings into run-loop deltas
///
/// Deltas above `max_delta_ms` are clamped, so a stall (debugger break,
/// window drag) does not turn into a burst of emulation.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    clock: Clock,
    last_ms: f64,
    max_delta_ms: f64,
}

impl FrameTimer {
    /// Create a timer clamping deltas to `max_delta_ms`
    pub fn new(max_delta_ms: f64) -> Self {
        let clock = Clock::new();
        Self {
            last_ms: clock.elapsed_ms(),
            clock,
            max_delta_ms,
        }
    }

    /// Milliseconds since the previous call, clamped
    pub fn tick(&mut self) -> f64 {
        let now = self.clock.elapsed_ms();
        let delta = now - self.last_ms;
        self.last_ms = now;
        if delta > self.max_delta_ms {
            debug!(
                "Clamping frame delta {:.2}ms to {:.2}ms",
                delta, self.max_delta_ms
            );
            self.max_delta_ms
        } else {
            delta.max(0.0)
        }
    }

    /// Time left until `period_ms` has passed since the last tick
    pub fn remaining(&self, period_ms: f64) -> Duration {
        let left = period_ms - (self.clock.elapsed_ms() - self.last_ms);
        if left > 0.0 {
            Duration::from_secs_f64(left / 1000.0)
        } else {
            Duration::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn test_clock_advances() {
        let clock = Clock::new();
        sleep(Duration::from_millis(5));
        assert!(clock.elapsed_ms() >= 5.0);
    }

    #[test]
    fn test_tick_is_clamped() {
        let mut timer = FrameTimer::new(2.0);
        sleep(Duration::from_millis(10));
        assert_eq!(timer.tick(), 2.0);
    }

    #[test]
    fn test_remaining_counts_down() {
        let mut timer = FrameTimer::new(100.0);
        timer.tick();
        assert!(timer.remaining(1000.0) > Duration::from_millis(500));
        assert_eq!(timer.remaining(0.0), Duration::ZERO);
    }
}
