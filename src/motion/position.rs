//! Position tracking for stepper motors.
//!
//! Absolute position in whole steps, accumulated across moves.

/// Absolute motor position in steps (from the origin set at reset).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Position {
    steps: i64,
}

impl Position {
    /// Position at the origin.
    pub const ORIGIN: Self = Self { steps: 0 };

    /// Create a position at a specific step count.
    #[inline]
    pub const fn at(steps: i64) -> Self {
        Self { steps }
    }

    /// Get current position in steps.
    #[inline]
    pub const fn steps(&self) -> i64 {
        self.steps
    }

    /// Move by a number of steps.
    #[inline]
    pub fn move_steps(&mut self, delta: i64) {
        self.steps += delta;
    }

    /// This position shifted by `delta` steps.
    #[inline]
    pub const fn offset(self, delta: i64) -> Self {
        Self {
            steps: self.steps + delta,
        }
    }
}
