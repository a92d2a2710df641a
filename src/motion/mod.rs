//! Motion module for polystep.
//!
//! Coefficient storage, the forward-difference integrator and position tracking.

mod coefficients;
mod integrator;
mod position;

pub use coefficients::{CoefficientVector, Coefficients};
pub use integrator::{Accumulators, AxisState, Direction, Integrator, IntegratorState};
pub use position::Position;
