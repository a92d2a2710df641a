//! Configuration module for polystep.
//!
//! Platform parameters (word layout, buffer depth, fixed-point scale, move length)
//! loaded from TOML files (with `std` feature) or built in code.

mod motor;
mod platform;
#[cfg(feature = "std")]
mod loader;
mod validation;

pub use motor::MotorConfig;
pub use platform::PlatformConfig;
pub use validation::validate_config;
pub(crate) use validation::validate_move_size;

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};
