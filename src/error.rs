//! Error types for polystep.
//!
//! The tick path itself never fails: like the hardware it models, a state machine
//! either advances or stays put. Errors come from the edges of the core instead:
//! configuration, instruction encoding, buffer overruns and pin I/O.

use core::fmt;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all polystep operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Instruction encoding or decoding error
    Encoding(EncodingError),
    /// Transactional buffer error
    Buffer(BufferError),
    /// Step/direction output error
    Motor(MotorError),
    /// Move validation error
    Motion(MotionError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// No motors configured
    NoMotors,
    /// More motors than the core supports
    TooManyMotors {
        /// Configured motor count
        count: usize,
        /// Supported maximum
        max: usize,
    },
    /// Duplicate motor name in configuration
    DuplicateMotorName(heapless::String<32>),
    /// `bytes_per_move` is not a whole number of words
    UnalignedMoveSize(usize),
    /// `bytes_per_move` cannot hold a header plus every coefficient
    MoveSizeTooSmall {
        /// Configured size in bytes
        bytes: usize,
        /// Smallest valid size in bytes
        minimum: usize,
    },
    /// `bytes_per_move` exceeds the largest supported instruction
    MoveSizeTooLarge {
        /// Configured size in bytes
        bytes: usize,
        /// Largest valid size in bytes
        maximum: usize,
    },
    /// Buffer cannot hold a single instruction
    BufferTooSmall {
        /// Usable buffer words
        words: usize,
        /// Words needed for one instruction
        required: usize,
    },
    /// Buffer depth differs from the configured depth
    BufferMismatch {
        /// Configured depth in words
        configured: usize,
        /// Depth of the supplied buffer
        actual: usize,
    },
    /// Fixed-point shift outside `1..=30`
    InvalidBitShift(u8),
    /// Ticks per move below two
    InvalidMaxTime(u32),
    /// Position accumulator cannot represent a full move
    AccumulatorOverflow {
        /// Bits needed by the accumulator
        bits: u32,
    },
    /// Tick rate must be positive
    InvalidTickRate(u32),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Instruction encoding errors.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodingError {
    /// Coefficient count does not match the motor count
    MotorCountMismatch {
        /// Motors in the instruction
        found: usize,
        /// Motors on the platform
        expected: usize,
    },
    /// Word stream shorter or longer than one instruction
    WrongLength {
        /// Words supplied
        found: usize,
        /// Words per instruction
        expected: usize,
    },
    /// Motor index outside the configured range
    MotorIndexOutOfRange(usize),
}

/// Transactional buffer errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    /// Write attempted with no free space
    Overflow,
}

/// Step/direction output errors.
#[derive(Debug, Clone, PartialEq)]
pub enum MotorError {
    /// Pin operation failed
    PinError,
    /// Pin pair count differs from the motor count
    MissingPins {
        /// Pin pairs supplied
        supplied: usize,
        /// Motors on the platform
        motors: usize,
    },
}

/// Move validation errors.
#[derive(Debug, Clone, PartialEq)]
pub enum MotionError {
    /// Position changes by more than half a step in one tick
    StepRateExceeded {
        /// Motor index
        motor: usize,
        /// Tick at which the limit is first exceeded
        tick: u32,
    },
    /// Move ends beyond the largest step count of one move
    TooManySteps {
        /// Motor index
        motor: usize,
        /// Steps the move would take
        steps: i64,
        /// Maximum steps per move
        max: i64,
    },
    /// Coefficient does not fit a signed word
    CoefficientOverflow {
        /// Motor index
        motor: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Encoding(e) => write!(f, "Encoding error: {}", e),
            Error::Buffer(e) => write!(f, "Buffer error: {}", e),
            Error::Motor(e) => write!(f, "Motor error: {}", e),
            Error::Motion(e) => write!(f, "Motion error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::NoMotors => write!(f, "At least one motor must be configured"),
            ConfigError::TooManyMotors { count, max } => {
                write!(f, "{} motors configured, at most {} supported", count, max)
            }
            ConfigError::DuplicateMotorName(name) => write!(f, "Duplicate motor name: '{}'", name),
            ConfigError::UnalignedMoveSize(bytes) => {
                write!(f, "bytes_per_move {} is not a multiple of the word size", bytes)
            }
            ConfigError::MoveSizeTooSmall { bytes, minimum } => {
                write!(f, "bytes_per_move {} below minimum {}", bytes, minimum)
            }
            ConfigError::MoveSizeTooLarge { bytes, maximum } => {
                write!(f, "bytes_per_move {} above maximum {}", bytes, maximum)
            }
            ConfigError::BufferTooSmall { words, required } => {
                write!(f, "Buffer holds {} words, one instruction needs {}", words, required)
            }
            ConfigError::BufferMismatch { configured, actual } => {
                write!(f, "Buffer depth {} does not match configured depth {}", actual, configured)
            }
            ConfigError::InvalidBitShift(v) => write!(f, "Invalid bit shift: {}. Must be 1-30", v),
            ConfigError::InvalidMaxTime(v) => write!(f, "Invalid max_time: {}. Must be >= 2", v),
            ConfigError::AccumulatorOverflow { bits } => {
                write!(f, "Position accumulator needs {} bits, at most 62 available", bits)
            }
            ConfigError::InvalidTickRate(v) => write!(f, "Invalid tick rate: {}. Must be > 0", v),
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodingError::MotorCountMismatch { found, expected } => {
                write!(f, "Instruction has {} motors, platform has {}", found, expected)
            }
            EncodingError::WrongLength { found, expected } => {
                write!(f, "Instruction is {} words, expected {}", found, expected)
            }
            EncodingError::MotorIndexOutOfRange(idx) => write!(f, "Motor index {} out of range", idx),
        }
    }
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferError::Overflow => write!(f, "Write with no free space"),
        }
    }
}

impl fmt::Display for MotorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotorError::PinError => write!(f, "GPIO pin operation failed"),
            MotorError::MissingPins { supplied, motors } => {
                write!(f, "{} pin pairs supplied for {} motors", supplied, motors)
            }
        }
    }
}

impl fmt::Display for MotionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionError::StepRateExceeded { motor, tick } => {
                write!(f, "Motor {} exceeds one step per two ticks at tick {}", motor, tick)
            }
            MotionError::TooManySteps { motor, steps, max } => {
                write!(f, "Motor {} move of {} steps exceeds maximum {}", motor, steps, max)
            }
            MotionError::CoefficientOverflow { motor } => {
                write!(f, "Motor {} coefficient does not fit a word", motor)
            }
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<EncodingError> for Error {
    fn from(e: EncodingError) -> Self {
        Error::Encoding(e)
    }
}

impl From<BufferError> for Error {
    fn from(e: BufferError) -> Self {
        Error::Buffer(e)
    }
}

impl From<MotorError> for Error {
    fn from(e: MotorError) -> Self {
        Error::Motor(e)
    }
}

impl From<MotionError> for Error {
    fn from(e: MotionError) -> Self {
        Error::Motion(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for EncodingError {}

#[cfg(feature = "std")]
impl std::error::Error for BufferError {}

#[cfg(feature = "std")]
impl std::error::Error for MotorError {}

#[cfg(feature = "std")]
impl std::error::Error for MotionError {}
