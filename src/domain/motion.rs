//! Bounded sinusoidal motion used by the simulation tick.

/// Parameters of the simulated motion along `x`.
///
/// Each tick adds `amplitude * sin(speed * now_ms * 0.01)` to `x`, so the
/// robot oscillates around its start position with a period driven by the
/// wall clock rather than the tick count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionProfile {
    /// Maximum displacement per tick.
    pub amplitude: f64,
    /// Angular speed factor applied to the wall-clock time.
    pub speed: f64,
}

impl MotionProfile {
    /// Creates a profile.
    #[must_use]
    pub const fn new(amplitude: f64, speed: f64) -> Self {
        Self { amplitude, speed }
    }

    /// Displacement of `x` for a tick at `now_ms` (milliseconds since the
    /// Unix epoch).
    #[must_use]
    pub fn step(&self, now_ms: i64) -> f64 {
        self.amplitude * (self.speed * now_ms as f64 * 0.01).sin()
    }
}

impl Default for MotionProfile {
    fn default() -> Self {
        Self::new(1.0, 0.1)
    }
}
