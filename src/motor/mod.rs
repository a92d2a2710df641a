//! Motor output module for polystep.
//!
//! Presents integrator outputs on embedded-hal STEP/DIR pins, and the
//! dispatcher's auxiliary byte on a bank of eight pins.

mod auxiliary;
mod pins;

pub use auxiliary::{AuxOutput, AuxPins};
pub use pins::{AxisOutput, StepDirPins};
