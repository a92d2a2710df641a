//! Platform configuration - root configuration structure.

use core::fmt::Write;

use heapless::{String, Vec};
use serde::Deserialize;

use crate::error::{ConfigError, Error, Result};
use crate::instruction::{DEGREE, MAX_MOTORS, WORD_BYTES};

use super::motor::MotorConfig;

/// Platform parameters shared by every component of the core.
///
/// Instruction layout: one header word, `3 × motors` coefficient words, then
/// zero padding up to `bytes_per_move`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlatformConfig {
    /// Motor channels, in coefficient order.
    #[serde(default = "default_motors")]
    pub motors: Vec<MotorConfig, MAX_MOTORS>,

    /// Length of one instruction in bytes (multiple of the word size).
    #[serde(default = "default_bytes_per_move")]
    pub bytes_per_move: usize,

    /// Storage depth of the instruction ring in words.
    #[serde(default = "default_buffer_depth")]
    pub buffer_depth_words: usize,

    /// Fixed-point shift: bit `bit_shift` of the position accumulator is the step line.
    #[serde(default = "default_bit_shift")]
    pub bit_shift: u8,

    /// Ticks per move.
    #[serde(default = "default_max_time")]
    pub max_time: u32,

    /// Tick rate of the real-time runner.
    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,
}

fn default_motors() -> Vec<MotorConfig, MAX_MOTORS> {
    let mut motors = Vec::new();
    for name in ["x", "y", "z"] {
        let _ = motors.push(MotorConfig::new(name));
    }
    motors
}

fn default_bytes_per_move() -> usize {
    PlatformConfig::minimal_bytes_per_move(3)
}

fn default_buffer_depth() -> usize {
    256
}

fn default_bit_shift() -> u8 {
    24
}

fn default_max_time() -> u32 {
    10_000
}

fn default_tick_hz() -> u32 {
    1_000_000
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            motors: default_motors(),
            bytes_per_move: default_bytes_per_move(),
            buffer_depth_words: default_buffer_depth(),
            bit_shift: default_bit_shift(),
            max_time: default_max_time(),
            tick_hz: default_tick_hz(),
        }
    }
}

impl PlatformConfig {
    /// Default platform with `motor_count` anonymous motors named `m0`, `m1`, ...
    ///
    /// `bytes_per_move` is set to the smallest size that fits.
    ///
    /// # Errors
    ///
    /// Returns an error for zero motors or more than [`MAX_MOTORS`].
    pub fn with_motor_count(motor_count: usize) -> Result<Self> {
        if motor_count == 0 {
            return Err(Error::Config(ConfigError::NoMotors));
        }
        if motor_count > MAX_MOTORS {
            return Err(Error::Config(ConfigError::TooManyMotors {
                count: motor_count,
                max: MAX_MOTORS,
            }));
        }

        let mut motors = Vec::new();
        for i in 0..motor_count {
            let mut name: String<32> = String::new();
            let _ = write!(name, "m{}", i);
            let _ = motors.push(MotorConfig {
                name,
                invert_direction: false,
            });
        }

        Ok(Self {
            motors,
            bytes_per_move: Self::minimal_bytes_per_move(motor_count),
            ..Self::default()
        })
    }

    /// Set the instruction length in bytes.
    pub fn bytes_per_move(mut self, bytes: usize) -> Self {
        self.bytes_per_move = bytes;
        self
    }

    /// Set the ring depth in words.
    pub fn buffer_depth_words(mut self, words: usize) -> Self {
        self.buffer_depth_words = words;
        self
    }

    /// Set the fixed-point shift.
    pub fn bit_shift(mut self, shift: u8) -> Self {
        self.bit_shift = shift;
        self
    }

    /// Set the ticks per move.
    pub fn max_time(mut self, ticks: u32) -> Self {
        self.max_time = ticks;
        self
    }

    /// Set the tick rate.
    pub fn tick_hz(mut self, hz: u32) -> Self {
        self.tick_hz = hz;
        self
    }

    /// Smallest word-aligned instruction for `motor_count` motors.
    pub const fn minimal_bytes_per_move(motor_count: usize) -> usize {
        WORD_BYTES * (1 + DEGREE * motor_count)
    }

    /// Number of motors.
    #[inline]
    pub fn motor_count(&self) -> usize {
        self.motors.len()
    }

    /// Words in one instruction, padding included.
    #[inline]
    pub fn words_per_move(&self) -> usize {
        self.bytes_per_move / WORD_BYTES
    }

    /// Coefficient words in one instruction.
    #[inline]
    pub fn coefficient_words(&self) -> usize {
        self.motors.len() * DEGREE
    }

    /// Accumulator shift giving whole steps (`bit_shift + 1`).
    #[inline]
    pub fn step_shift(&self) -> u32 {
        self.bit_shift as u32 + 1
    }

    /// Accumulator units per step.
    #[inline]
    pub fn step_scale(&self) -> i64 {
        1i64 << self.step_shift()
    }

    /// Most steps a motor can take in one move (one step per two ticks).
    #[inline]
    pub fn max_steps(&self) -> i64 {
        (self.max_time / 2) as i64
    }

    /// Tick period in nanoseconds.
    #[inline]
    pub fn tick_period_ns(&self) -> u32 {
        if self.tick_hz == 0 {
            u32::MAX
        } else {
            1_000_000_000 / self.tick_hz
        }
    }

    /// Look up a motor by name, returning its index.
    pub fn motor(&self, name: &str) -> Option<(usize, &MotorConfig)> {
        self.motors
            .iter()
            .enumerate()
            .find(|(_, m)| m.name.as_str() == name)
    }

    /// List all motor names.
    pub fn motor_names(&self) -> impl Iterator<Item = &str> {
        self.motors.iter().map(|m| m.name.as_str())
    }
}
