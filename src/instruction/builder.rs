//! Host-side construction of `MOVE` instructions.

use heapless::Vec;
use libm::round;

use crate::config::PlatformConfig;
use crate::error::{EncodingError, Error, MotionError, Result};
use crate::motion::{Accumulators, Coefficients};

use super::encoding::Instruction;
use super::opcode::MAX_MOTORS;

/// Motion of one motor at the start of a move, in steps per tick.
///
/// Position over the move is `v·t + a·t²/2 + j·t³/6` steps.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Kinematics {
    /// Steps per tick.
    pub velocity: f64,
    /// Steps per tick².
    pub acceleration: f64,
    /// Steps per tick³.
    pub jerk: f64,
}

impl Kinematics {
    /// Constant velocity.
    pub const fn constant(velocity: f64) -> Self {
        Self {
            velocity,
            acceleration: 0.0,
            jerk: 0.0,
        }
    }

    /// Constant acceleration from `velocity`.
    pub const fn accelerating(velocity: f64, acceleration: f64) -> Self {
        Self {
            velocity,
            acceleration,
            jerk: 0.0,
        }
    }

    /// Fixed-point coefficients for a platform scale of `step_scale` units per step.
    ///
    /// Returns `None` if a term does not fit a signed word.
    pub fn to_coefficients(&self, step_scale: i64) -> Option<Coefficients> {
        let scale = step_scale as f64;
        let linear = to_word(self.velocity * scale)?;
        let quadratic = to_word(self.acceleration / 2.0 * scale)?;
        let cubic = to_word(self.jerk / 6.0 * scale)?;
        Some(Coefficients::new(linear, quadratic, cubic))
    }
}

fn to_word(value: f64) -> Option<i32> {
    let rounded = round(value);
    if rounded >= i32::MIN as f64 && rounded <= i32::MAX as f64 {
        Some(rounded as i32)
    } else {
        None
    }
}

/// Builder for `MOVE` instructions.
#[derive(Debug, Clone)]
pub struct MoveBuilder<'a> {
    config: &'a PlatformConfig,
    aux: u8,
    axes: Vec<Coefficients, MAX_MOTORS>,
    error: Option<Error>,
}

impl<'a> MoveBuilder<'a> {
    /// Create a builder with every motor stationary.
    pub fn new(config: &'a PlatformConfig) -> Self {
        let mut axes = Vec::new();
        for _ in 0..config.motor_count() {
            let _ = axes.push(Coefficients::ZERO);
        }
        Self {
            config,
            aux: 0,
            axes,
            error: None,
        }
    }

    /// Set the auxiliary output byte.
    pub fn aux(mut self, aux: u8) -> Self {
        self.aux = aux;
        self
    }

    /// Set raw coefficients for motor `index`.
    pub fn coefficients(mut self, index: usize, coefficients: Coefficients) -> Self {
        match self.axes.get_mut(index) {
            Some(axis) => *axis = coefficients,
            None => self.fail(EncodingError::MotorIndexOutOfRange(index).into()),
        }
        self
    }

    /// Set the motion of motor `index`.
    pub fn axis(self, index: usize, kinematics: Kinematics) -> Self {
        match kinematics.to_coefficients(self.config.step_scale()) {
            Some(c) => self.coefficients(index, c),
            None => {
                let mut this = self;
                this.fail(MotionError::CoefficientOverflow { motor: index }.into());
                this
            }
        }
    }

    /// Set the motion of a motor by name.
    pub fn named(self, name: &str, kinematics: Kinematics) -> Self {
        match self.config.motor(name) {
            Some((index, _)) => self.axis(index, kinematics),
            None => {
                let mut this = self;
                let index = this.config.motor_count();
                this.fail(EncodingError::MotorIndexOutOfRange(index).into());
                this
            }
        }
    }

    fn fail(&mut self, error: Error) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Build the instruction.
    ///
    /// # Errors
    ///
    /// Returns the first error recorded while building, or a move validation
    /// error from [`validate_move`].
    pub fn build(self) -> Result<Instruction> {
        if let Some(e) = self.error {
            return Err(e);
        }
        validate_move(self.config, &self.axes)?;
        Ok(Instruction::new_move(self.aux, &self.axes))
    }
}

/// Check that a move is executable on `config`.
///
/// Runs the exact recurrence for every motor over the whole move:
/// - the position may change by at most `2^bit_shift` per tick, so the step
///   line toggles at most once per tick (at most one step per two ticks);
/// - the step count never leaves `±max_steps`.
///
/// Returns the final step count of each motor.
///
/// # Errors
///
/// Returns [`MotionError::StepRateExceeded`] or [`MotionError::TooManySteps`].
pub fn validate_move(config: &PlatformConfig, axes: &[Coefficients]) -> Result<Vec<i64, MAX_MOTORS>> {
    let limit = 1i64 << config.bit_shift;
    let shift = config.step_shift();
    let max_steps = config.max_steps();
    let mut totals = Vec::new();

    for (motor, c) in axes.iter().enumerate() {
        let mut acc = Accumulators::load(c);
        for tick in 0..config.max_time {
            if acc.velocity().abs() > limit {
                return Err(Error::Motion(MotionError::StepRateExceeded { motor, tick }));
            }
            acc.advance();
            let steps = acc.position() >> shift;
            if steps.abs() > max_steps {
                return Err(Error::Motion(MotionError::TooManySteps {
                    motor,
                    steps,
                    max: max_steps,
                }));
            }
        }
        let _ = totals.push(acc.position() >> shift);
    }

    Ok(totals)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PlatformConfig {
        PlatformConfig::with_motor_count(2)
            .unwrap()
            .bit_shift(16)
            .max_time(1000)
    }

    #[test]
    fn test_constant_velocity_coefficients() {
        let config = config();
        let c = Kinematics::constant(0.25).to_coefficients(config.step_scale()).unwrap();
        assert_eq!(c, Coefficients::linear(1 << 15));
    }

    #[test]
    fn test_build_linear_move() {
        let config = config();
        let instr = MoveBuilder::new(&config)
            .aux(3)
            .axis(0, Kinematics::constant(0.25))
            .named("m1", Kinematics::constant(-0.5))
            .build()
            .unwrap();

        assert_eq!(instr.aux(), 3);
        let totals = validate_move(&config, instr.coefficients()).unwrap();
        assert_eq!(totals[0], 250);
        assert_eq!(totals[1], -500);
    }

    #[test]
    fn test_accelerating_move() {
        let config = config();
        // 0 -> 0.4 steps/tick over 1000 ticks: 200 steps before rounding
        let instr = MoveBuilder::new(&config)
            .axis(0, Kinematics::accelerating(0.0, 0.0004))
            .build()
            .unwrap();
        assert_eq!(instr.coefficients()[0], Coefficients::new(0, 26, 0));
        let totals = validate_move(&config, instr.coefficients()).unwrap();
        assert!((totals[0] - 200).abs() <= 3);
    }

    #[test]
    fn test_step_rate_exceeded() {
        let config = config();
        let result = MoveBuilder::new(&config)
            .axis(1, Kinematics::constant(0.75))
            .build();
        assert!(matches!(
            result,
            Err(Error::Motion(MotionError::StepRateExceeded { motor: 1, tick: 0 }))
        ));
    }

    #[test]
    fn test_unknown_motor() {
        let config = config();
        let result = MoveBuilder::new(&config)
            .named("z", Kinematics::constant(0.1))
            .build();
        assert!(matches!(
            result,
            Err(Error::Encoding(EncodingError::MotorIndexOutOfRange(2)))
        ));
    }

    #[test]
    fn test_coefficient_overflow() {
        let config = config();
        let result = MoveBuilder::new(&config)
            .axis(0, Kinematics::constant(1.0e6))
            .build();
        assert!(matches!(
            result,
            Err(Error::Motion(MotionError::CoefficientOverflow { motor: 0 }))
        ));
    }
}
