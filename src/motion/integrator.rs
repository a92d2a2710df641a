//! Polynomial trajectory integrator.
//!
//! Each motor follows `p(t) = a₁t + a₂t² + a₃t³` for `t = 0 … max_time`. The
//! cubic is evaluated by forward differences: with
//!
//! ```text
//! Δ¹(0) = a₁ + a₂ + a₃
//! Δ²(0) = 2a₂ + 6a₃
//! Δ³    = 6a₃            (constant for a cubic)
//! ```
//!
//! every tick adds `Δ¹` to the position, `Δ²` to `Δ¹` and `Δ³` to `Δ²`. After
//! `t` ticks the position equals `p(t)` exactly, using only additions.

use heapless::Vec;

use crate::instruction::MAX_MOTORS;

use super::coefficients::{CoefficientVector, Coefficients};
use super::position::Position;

/// Direction of motor motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Position increasing (direction line high).
    #[default]
    Forward,
    /// Position decreasing (direction line low).
    Reverse,
}

impl Direction {
    /// Level of a non-inverted direction line.
    #[inline]
    pub fn is_forward(self) -> bool {
        self == Direction::Forward
    }
}

/// Forward-difference accumulators of one motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Accumulators {
    position: i64,
    first: i64,
    second: i64,
    third: i64,
}

impl Accumulators {
    /// Accumulators at `t = 0` for the given polynomial.
    pub fn load(c: &Coefficients) -> Self {
        let a1 = c.linear as i64;
        let a2 = c.quadratic as i64;
        let a3 = c.cubic as i64;
        let six_a3 = (a3 << 2) + (a3 << 1);
        Self {
            position: 0,
            first: a1 + a2 + a3,
            second: (a2 << 1) + six_a3,
            third: six_a3,
        }
    }

    /// Advance one tick.
    ///
    /// Wrapping addition mirrors a fixed-width register; configuration
    /// validation keeps legal moves inside the range.
    #[inline]
    pub fn advance(&mut self) {
        self.position = self.position.wrapping_add(self.first);
        self.first = self.first.wrapping_add(self.second);
        self.second = self.second.wrapping_add(self.third);
    }

    /// Position in accumulator units.
    #[inline]
    pub fn position(&self) -> i64 {
        self.position
    }

    /// Position change the next tick will apply.
    #[inline]
    pub fn velocity(&self) -> i64 {
        self.first
    }
}

/// Motion state and outputs of one motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisState {
    accumulators: Accumulators,
    direction: Direction,
    step: bool,
    total_steps: i64,
    origin: Position,
}

impl AxisState {
    /// Restart motion from zero with new coefficients.
    ///
    /// Steps of the previous move are folded into the absolute origin first.
    fn load(&mut self, c: &Coefficients) {
        self.origin.move_steps(self.total_steps);
        self.accumulators = Accumulators::load(c);
        self.step = false;
        self.total_steps = 0;
    }

    fn advance(&mut self, bit_shift: u32) {
        let previous = self.accumulators.position();
        self.accumulators.advance();
        let position = self.accumulators.position();

        if position > previous {
            self.direction = Direction::Forward;
        } else if position < previous {
            self.direction = Direction::Reverse;
        }

        self.step = (position >> bit_shift) & 1 == 1;
        self.total_steps = position >> (bit_shift + 1);
    }

    /// Step line level.
    #[inline]
    pub fn step(&self) -> bool {
        self.step
    }

    /// Direction line.
    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Steps taken in the current or just-finished move.
    #[inline]
    pub fn total_steps(&self) -> i64 {
        self.total_steps
    }

    /// Raw position accumulator.
    #[inline]
    pub fn accumulator(&self) -> i64 {
        self.accumulators.position()
    }

    /// Absolute position in steps since the last reset.
    #[inline]
    pub fn position(&self) -> Position {
        self.origin.offset(self.total_steps)
    }
}

/// Integrator state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IntegratorState {
    /// Power-on; moves to `WaitStart` on the next tick.
    #[default]
    Reset,
    /// Idle, waiting for a start pulse.
    WaitStart,
    /// Evaluating a move.
    Running,
}

/// Per-axis cubic integrator driving step and direction lines.
#[derive(Debug, Clone)]
pub struct Integrator {
    state: IntegratorState,
    axes: Vec<AxisState, MAX_MOTORS>,
    time: u32,
    max_time: u32,
    bit_shift: u32,
    busy: bool,
    finished: bool,
    moves: u32,
}

impl Integrator {
    /// Create an integrator for `motors` motors.
    pub fn new(motors: usize, bit_shift: u8, max_time: u32) -> Self {
        let mut axes = Vec::new();
        for _ in 0..motors.min(MAX_MOTORS) {
            let _ = axes.push(AxisState::default());
        }
        Self {
            state: IntegratorState::Reset,
            axes,
            time: 0,
            max_time,
            bit_shift: bit_shift as u32,
            busy: false,
            finished: false,
            moves: 0,
        }
    }

    /// Advance one tick.
    ///
    /// `start` and `coefficients` are the values registered on the previous tick.
    pub fn tick(&mut self, start: bool, coefficients: &CoefficientVector) {
        match self.state {
            IntegratorState::Reset => {
                self.busy = false;
                self.finished = false;
                self.state = IntegratorState::WaitStart;
            }
            IntegratorState::WaitStart => {
                self.finished = false;
                if start {
                    for (i, axis) in self.axes.iter_mut().enumerate() {
                        let c = coefficients.motor(i).copied().unwrap_or_default();
                        axis.load(&c);
                    }
                    self.busy = true;
                    self.state = IntegratorState::Running;
                    debug!("integrator: move {} started", self.moves);
                }
            }
            IntegratorState::Running => {
                if self.time < self.max_time {
                    for axis in self.axes.iter_mut() {
                        axis.advance(self.bit_shift);
                    }
                    self.time += 1;
                } else {
                    self.time = 0;
                    self.busy = false;
                    self.finished = true;
                    self.moves = self.moves.wrapping_add(1);
                    self.state = IntegratorState::WaitStart;
                    debug!("integrator: move finished");
                }
            }
        }
    }

    /// Return to power-on state, keeping the motor count and scale.
    pub fn reset(&mut self) {
        for axis in self.axes.iter_mut() {
            *axis = AxisState::default();
        }
        self.state = IntegratorState::Reset;
        self.time = 0;
        self.busy = false;
        self.finished = false;
        self.moves = 0;
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> IntegratorState {
        self.state
    }

    /// A move is running.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// High for exactly one tick when a move completes.
    #[inline]
    pub fn finished(&self) -> bool {
        self.finished
    }

    /// Ticks elapsed in the current move.
    #[inline]
    pub fn elapsed(&self) -> u32 {
        self.time
    }

    /// Moves completed since reset.
    #[inline]
    pub fn moves_completed(&self) -> u32 {
        self.moves
    }

    /// Per-motor outputs.
    #[inline]
    pub fn axes(&self) -> &[AxisState] {
        &self.axes
    }

    /// Outputs of one motor.
    #[inline]
    pub fn axis(&self, index: usize) -> Option<&AxisState> {
        self.axes.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHIFT: u8 = 8;

    fn run_move(integrator: &mut Integrator, coefficients: &CoefficientVector) -> u32 {
        // Leave Reset
        integrator.tick(false, coefficients);
        integrator.tick(true, coefficients);
        let mut ticks = 0;
        while integrator.is_busy() {
            integrator.tick(false, coefficients);
            ticks += 1;
            assert!(ticks < 1_000_000);
        }
        ticks
    }

    #[test]
    fn test_accumulators_match_polynomial() {
        let c = Coefficients::new(17, -3, 1);
        let mut acc = Accumulators::load(&c);
        for t in 1..=500 {
            acc.advance();
            assert_eq!(acc.position(), c.evaluate(t), "tick {}", t);
        }
    }

    #[test]
    fn test_zero_move() {
        let coefficients = CoefficientVector::zeroed(3);
        let mut integrator = Integrator::new(3, SHIFT, 100);
        run_move(&mut integrator, &coefficients);

        assert!(integrator.finished());
        for axis in integrator.axes() {
            assert_eq!(axis.total_steps(), 0);
            assert!(!axis.step());
        }

        integrator.tick(false, &coefficients);
        assert!(!integrator.finished());
    }

    #[test]
    fn test_move_takes_max_time_ticks() {
        let coefficients = CoefficientVector::zeroed(1);
        let mut integrator = Integrator::new(1, SHIFT, 100);
        // max_time advancing ticks plus the finishing tick
        assert_eq!(run_move(&mut integrator, &coefficients), 101);
        assert_eq!(integrator.elapsed(), 0);
        assert_eq!(integrator.state(), IntegratorState::WaitStart);
    }

    #[test]
    fn test_linear_move_step_count() {
        // a quarter step per tick
        let quarter = 1 << (SHIFT as u32 + 1 - 2);
        let coefficients = CoefficientVector::from_slice(&[Coefficients::linear(quarter)]);
        let mut integrator = Integrator::new(1, SHIFT, 400);
        run_move(&mut integrator, &coefficients);

        let axis = integrator.axis(0).unwrap();
        assert_eq!(axis.total_steps(), 100);
        assert_eq!(axis.position().steps(), 100);
        assert_eq!(axis.direction(), Direction::Forward);
    }

    #[test]
    fn test_reverse_move() {
        let quarter = 1 << (SHIFT as u32 + 1 - 2);
        let coefficients = CoefficientVector::from_slice(&[Coefficients::linear(-quarter)]);
        let mut integrator = Integrator::new(1, SHIFT, 400);
        run_move(&mut integrator, &coefficients);

        let axis = integrator.axis(0).unwrap();
        assert_eq!(axis.position().steps(), -100);
        assert_eq!(axis.direction(), Direction::Reverse);
    }

    #[test]
    fn test_direction_holds_when_stationary() {
        let mut axis = AxisState::default();
        axis.load(&Coefficients::linear(-4));
        axis.advance(SHIFT as u32);
        assert_eq!(axis.direction(), Direction::Reverse);

        axis.load(&Coefficients::ZERO);
        axis.advance(SHIFT as u32);
        assert_eq!(axis.direction(), Direction::Reverse);
    }

    #[test]
    fn test_reset_clears_position() {
        let quarter = 1 << (SHIFT as u32 + 1 - 2);
        let coefficients = CoefficientVector::from_slice(&[Coefficients::linear(quarter)]);
        let mut integrator = Integrator::new(1, SHIFT, 40);
        run_move(&mut integrator, &coefficients);
        assert_eq!(integrator.moves_completed(), 1);

        integrator.reset();
        assert_eq!(integrator.state(), IntegratorState::Reset);
        assert_eq!(integrator.axis(0).unwrap().position().steps(), 0);
        assert_eq!(integrator.moves_completed(), 0);
    }
}
