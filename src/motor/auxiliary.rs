//! Auxiliary output byte.

use embedded_hal::digital::OutputPin;

use crate::error::{MotorError, Result};

/// Something that can present the auxiliary byte latched on dispatch.
pub trait AuxOutput {
    /// Drive the outputs to `value`.
    ///
    /// # Errors
    ///
    /// Returns [`MotorError::PinError`] if a pin cannot be written.
    fn set_aux(&mut self, value: u8) -> Result<()>;
}

/// No auxiliary outputs wired.
impl AuxOutput for () {
    fn set_aux(&mut self, _value: u8) -> Result<()> {
        Ok(())
    }
}

/// Eight output pins, bit `i` of the byte on `pins[i]`.
///
/// Only pins whose bit changed are written.
pub struct AuxPins<P: OutputPin> {
    pins: [P; 8],
    value: Option<u8>,
}

impl<P: OutputPin> AuxPins<P> {
    /// Wrap eight pins, least significant bit first.
    pub fn new(pins: [P; 8]) -> Self {
        Self { pins, value: None }
    }

    /// Last written byte, if any.
    #[inline]
    pub fn value(&self) -> Option<u8> {
        self.value
    }

    /// Release the pins.
    pub fn release(self) -> [P; 8] {
        self.pins
    }
}

impl<P: OutputPin> AuxOutput for AuxPins<P> {
    fn set_aux(&mut self, value: u8) -> Result<()> {
        let changed = match self.value {
            Some(previous) => previous ^ value,
            None => 0xff,
        };

        for (bit, pin) in self.pins.iter_mut().enumerate() {
            if changed & (1 << bit) == 0 {
                continue;
            }
            if value & (1 << bit) != 0 {
                pin.set_high().map_err(|_| MotorError::PinError)?;
            } else {
                pin.set_low().map_err(|_| MotorError::PinError)?;
            }
        }

        self.value = Some(value);
        Ok(())
    }
}
