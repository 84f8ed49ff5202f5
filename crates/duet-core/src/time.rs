//! Fixed-rate simulation time
//!
//! - `Tick` - logical time unit
//! - `TickRate` - fixed simulation frequency
//! - `Clock` - turns variable frame time into whole ticks plus a render alpha

use serde::{Deserialize, Serialize};

/// A discrete tick identifier (logical time unit)
pub type Tick = u64;

/// Fixed simulation frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickRate {
    /// Ticks per second
    pub hz: u32,
}

impl TickRate {
    /// Create a tick rate; zero is clamped to one tick per second
    pub fn new(hz: u32) -> Self {
        Self { hz: hz.max(1) }
    }

    /// Seconds per tick
    pub fn dt(&self) -> f32 {
        1.0 / self.hz.max(1) as f32
    }
}

impl Default for TickRate {
    fn default() -> Self {
        Self { hz: 60 }
    }
}

/// Simulation clock with a frame-time accumulator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clock {
    /// Number of ticks produced so far
    pub tick: Tick,
    /// Fixed tick rate
    pub rate: TickRate,
    /// Upper bound on ticks produced by one frame
    pub max_steps_per_frame: u32,
    accumulator: f32,
}

impl Clock {
    /// Create a new clock
    pub fn new(rate: TickRate) -> Self {
        Self {
            tick: 0,
            rate,
            max_steps_per_frame: 8,
            accumulator: 0.0,
        }
    }

    /// Limit the ticks a single long frame may produce
    pub fn with_max_steps(mut self, steps: u32) -> Self {
        self.max_steps_per_frame = steps.max(1);
        self
    }

    /// Feed one frame's elapsed seconds and return the number of fixed ticks to run
    ///
    /// Time beyond `max_steps_per_frame` ticks is dropped rather than carried
    /// into the next frame.
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        let dt = self.rate.dt();
        self.accumulator += frame_dt.max(0.0);

        let mut steps = 0;
        while self.accumulator >= dt && steps < self.max_steps_per_frame {
            self.accumulator -= dt;
            steps += 1;
        }
        if steps == self.max_steps_per_frame {
            self.accumulator = self.accumulator.min(dt);
        }
        self.tick += steps as Tick;
        steps
    }

    /// Fraction of a tick elapsed since the last produced tick, in `[0, 1]`
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.rate.dt()).clamp(0.0, 1.0)
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(TickRate::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_rate() {
        assert!((TickRate::default().dt() - 1.0 / 60.0).abs() < 1e-6);
        assert_eq!(TickRate::new(0).hz, 1);
    }

    #[test]
    fn test_clock_accumulates() {
        let mut clock = Clock::new(TickRate::new(10));
        assert_eq!(clock.advance(0.05), 0);
        assert!((clock.alpha() - 0.5).abs() < 1e-4);
        assert_eq!(clock.advance(0.06), 1);
        assert_eq!(clock.advance(0.25), 2);
        assert_eq!(clock.tick, 3);
    }

    #[test]
    fn test_clock_caps_long_frames() {
        let mut clock = Clock::new(TickRate::new(10)).with_max_steps(3);
        assert_eq!(clock.advance(5.0), 3);
        assert!(clock.alpha() <= 1.0);
        assert_eq!(clock.advance(0.0), 1);
    }
}
