//! STEP/DIR output stage.
//!
//! Generic over embedded-hal 1.0 output pins.

use embedded_hal::digital::OutputPin;

use crate::config::MotorConfig;
use crate::error::{MotorError, Result};
use crate::motion::{AxisState, Direction};

/// Something that can present one axis' outputs.
pub trait AxisOutput {
    /// Drive the outputs to match `axis`.
    ///
    /// # Errors
    ///
    /// Returns [`MotorError::PinError`] if a pin cannot be written.
    fn apply(&mut self, axis: &AxisState) -> Result<()>;
}

/// STEP and DIR pins of one stepper driver.
///
/// Pins are only written when their level changes.
pub struct StepDirPins<STEP, DIR>
where
    STEP: OutputPin,
    DIR: OutputPin,
{
    /// STEP pin, mirrors the step line.
    step_pin: STEP,

    /// DIR pin (high = forward, unless inverted).
    dir_pin: DIR,

    /// Whether direction pin logic is inverted.
    invert_direction: bool,

    /// Last written step level.
    step: Option<bool>,

    /// Last written direction.
    direction: Option<Direction>,
}

impl<STEP, DIR> StepDirPins<STEP, DIR>
where
    STEP: OutputPin,
    DIR: OutputPin,
{
    /// Wrap a pin pair.
    pub fn new(step_pin: STEP, dir_pin: DIR) -> Self {
        Self {
            step_pin,
            dir_pin,
            invert_direction: false,
            step: None,
            direction: None,
        }
    }

    /// Wrap a pin pair using a motor's configured polarity.
    pub fn from_config(step_pin: STEP, dir_pin: DIR, config: &MotorConfig) -> Self {
        Self::new(step_pin, dir_pin).inverted(config.invert_direction)
    }

    /// Invert the direction pin.
    pub fn inverted(mut self, invert: bool) -> Self {
        self.invert_direction = invert;
        self
    }

    /// Set the step pin level.
    pub fn set_step(&mut self, high: bool) -> Result<()> {
        if self.step == Some(high) {
            return Ok(());
        }

        if high {
            self.step_pin.set_high().map_err(|_| MotorError::PinError)?;
        } else {
            self.step_pin.set_low().map_err(|_| MotorError::PinError)?;
        }

        self.step = Some(high);
        Ok(())
    }

    /// Set the direction pin.
    pub fn set_direction(&mut self, direction: Direction) -> Result<()> {
        if self.direction == Some(direction) {
            return Ok(());
        }

        let pin_high = direction.is_forward() != self.invert_direction;
        if pin_high {
            self.dir_pin.set_high().map_err(|_| MotorError::PinError)?;
        } else {
            self.dir_pin.set_low().map_err(|_| MotorError::PinError)?;
        }

        self.direction = Some(direction);
        Ok(())
    }

    /// Last written direction, if any.
    #[inline]
    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    /// Release the pins.
    pub fn release(self) -> (STEP, DIR) {
        (self.step_pin, self.dir_pin)
    }
}

impl<STEP, DIR> AxisOutput for StepDirPins<STEP, DIR>
where
    STEP: OutputPin,
    DIR: OutputPin,
{
    fn apply(&mut self, axis: &AxisState) -> Result<()> {
        // direction settles before the step edge
        self.set_direction(axis.direction())?;
        self.set_step(axis.step())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::digital::{Mock as PinMock, State, Transaction};

    #[test]
    fn test_writes_only_on_change() {
        let step = PinMock::new(&[
            Transaction::set(State::High),
            Transaction::set(State::Low),
        ]);
        let dir = PinMock::new(&[Transaction::set(State::High)]);
        let mut pins = StepDirPins::new(step, dir);

        pins.set_direction(Direction::Forward).unwrap();
        pins.set_direction(Direction::Forward).unwrap();
        pins.set_step(true).unwrap();
        pins.set_step(true).unwrap();
        pins.set_step(false).unwrap();

        let (mut step, mut dir) = pins.release();
        step.done();
        dir.done();
    }

    #[test]
    fn test_inverted_direction() {
        let step = PinMock::new(&[]);
        let dir = PinMock::new(&[
            Transaction::set(State::Low),
            Transaction::set(State::High),
        ]);
        let config = MotorConfig::new("x").inverted(true);
        let mut pins = StepDirPins::from_config(step, dir, &config);

        pins.set_direction(Direction::Forward).unwrap();
        pins.set_direction(Direction::Reverse).unwrap();
        assert_eq!(pins.direction(), Some(Direction::Reverse));

        let (mut step, mut dir) = pins.release();
        step.done();
        dir.done();
    }
}
