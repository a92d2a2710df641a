//! # polystep
//!
//! Tick-driven command and motion core for multi-axis stepper controllers.
//!
//! ## Features
//!
//! - **Word protocol**: `EMPTY`, `START`, `STOP`, `WRITE` and `STATUS` commands over
//!   any link that moves one command code and one 32-bit word per transaction
//! - **Transactional buffering**: instructions become visible to the dispatcher
//!   only once complete, and are released only once fully consumed
//! - **Exact polynomial motion**: each axis follows `a₁t + a₂t² + a₃t³`, evaluated
//!   by forward differences with additions only
//! - **Fail-stop dispatch**: an unknown opcode latches a sticky fault until reset
//! - **embedded-hal 1.0**: `OutputPin` for STEP/DIR, `DelayNs` for tick timing
//! - **no_std compatible**: Core library works without standard library
//!
//! ## Quick Start
//!
//! ```rust
//! use polystep::{Coefficients, Instruction, PlatformConfig, Simulator, TransactionalFifo, WriteOutcome};
//!
//! let config = PlatformConfig::with_motor_count(2)?
//!     .bytes_per_move(28)
//!     .buffer_depth_words(64)
//!     .bit_shift(8)
//!     .max_time(1000);
//! let mut sim = Simulator::new(config, TransactionalFifo::<64>::new())?;
//!
//! // Half a step every tick on motor 0 for the whole move
//! let instr = Instruction::new_move(0, &[Coefficients::linear(256), Coefficients::ZERO]);
//! assert_eq!(sim.write_instruction(&instr)?, WriteOutcome::Accepted);
//! sim.start();
//! sim.run_until_idle(10_000);
//!
//! assert_eq!(sim.controller().axes()[0].total_steps(), 500);
//! # Ok::<(), polystep::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables file I/O and TOML parsing
//! - `alloc`: Enables heap allocation for no_std with allocator
//! - `defmt`: Enables defmt logging for embedded targets

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]
// Allow large error types - necessary for no_std with heapless strings
#![allow(clippy::result_large_err)]

#[cfg(feature = "alloc")]
extern crate alloc;

// Must come first so the macros are visible to every module below
#[macro_use]
mod logging;

// Core modules
pub mod buffer;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod instruction;
pub mod motion;
pub mod motor;
pub mod protocol;
pub mod runtime;
pub mod sim;

// Re-exports for ergonomic API
pub use buffer::{TransactionalBuffer, TransactionalFifo};
pub use config::{validate_config, MotorConfig, PlatformConfig};
pub use controller::{Controller, Registers};
pub use dispatch::{DispatchState, Dispatcher};
pub use error::{Error, Result};
pub use instruction::{validate_move, Command, Instruction, Kinematics, MoveBuilder, Opcode, StatusWord};
pub use motion::{AxisState, CoefficientVector, Coefficients, Direction, Integrator, IntegratorState, Position};
pub use motor::{AuxOutput, AuxPins, AxisOutput, StepDirPins};
pub use protocol::{HandlerState, LinkInput, ProtocolHandler};
pub use runtime::{FixedRateRunner, LinkSource};
pub use sim::{Simulator, WriteOutcome};

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::{load_config, parse_config};
