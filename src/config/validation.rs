//! Configuration validation.

use crate::error::{ConfigError, Error, Result};
use crate::instruction::{MAX_MOTORS, MAX_WORDS_PER_MOVE, WORD_BYTES};

use super::PlatformConfig;

/// Accumulator bits available once a sign bit and one bit of headroom are kept.
const ACCUMULATOR_BITS: u32 = 62;

/// Validate a platform configuration.
///
/// Checks:
/// - Motor list is non-empty, bounded and uniquely named
/// - Instruction length is word aligned and fits header plus coefficients
/// - The ring holds at least one instruction
/// - Fixed-point shift, move length and tick rate are in range
/// - The position accumulator cannot overflow during a full-speed move
pub fn validate_config(config: &PlatformConfig) -> Result<()> {
    validate_motors(config)?;
    validate_layout(config)?;
    validate_timing(config)?;
    Ok(())
}

fn validate_motors(config: &PlatformConfig) -> Result<()> {
    if config.motors.is_empty() {
        return Err(Error::Config(ConfigError::NoMotors));
    }

    if config.motors.len() > MAX_MOTORS {
        return Err(Error::Config(ConfigError::TooManyMotors {
            count: config.motors.len(),
            max: MAX_MOTORS,
        }));
    }

    for (i, motor) in config.motors.iter().enumerate() {
        if config.motors[..i].iter().any(|m| m.name == motor.name) {
            return Err(Error::Config(ConfigError::DuplicateMotorName(
                motor.name.clone(),
            )));
        }
    }

    Ok(())
}

fn validate_layout(config: &PlatformConfig) -> Result<()> {
    validate_move_size(config)?;

    // One ring slot always stays empty
    let usable = config.buffer_depth_words.saturating_sub(1);
    if usable < config.words_per_move() {
        return Err(Error::Config(ConfigError::BufferTooSmall {
            words: usable,
            required: config.words_per_move(),
        }));
    }

    Ok(())
}

/// Check that `bytes_per_move` is a whole number of words holding the header
/// and every coefficient.
pub(crate) fn validate_move_size(config: &PlatformConfig) -> Result<()> {
    let bytes = config.bytes_per_move;

    if bytes % WORD_BYTES != 0 {
        return Err(Error::Config(ConfigError::UnalignedMoveSize(bytes)));
    }

    let minimum = PlatformConfig::minimal_bytes_per_move(config.motor_count());
    if bytes < minimum {
        return Err(Error::Config(ConfigError::MoveSizeTooSmall { bytes, minimum }));
    }

    let maximum = WORD_BYTES * MAX_WORDS_PER_MOVE;
    if bytes > maximum {
        return Err(Error::Config(ConfigError::MoveSizeTooLarge { bytes, maximum }));
    }

    Ok(())
}

fn validate_timing(config: &PlatformConfig) -> Result<()> {
    if config.bit_shift == 0 || config.bit_shift > 30 {
        return Err(Error::Config(ConfigError::InvalidBitShift(config.bit_shift)));
    }

    if config.max_time < 2 {
        return Err(Error::Config(ConfigError::InvalidMaxTime(config.max_time)));
    }

    let steps_bits = 64 - (config.max_steps() as u64).leading_zeros();
    let bits = steps_bits + config.step_shift();
    if bits > ACCUMULATOR_BITS {
        return Err(Error::Config(ConfigError::AccumulatorOverflow { bits }));
    }

    if config.tick_hz == 0 {
        return Err(Error::Config(ConfigError::InvalidTickRate(config.tick_hz)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MotorConfig;

    #[test]
    fn test_default_is_valid() {
        assert!(validate_config(&PlatformConfig::default()).is_ok());
    }

    #[test]
    fn test_unaligned_move_size() {
        let config = PlatformConfig::default().bytes_per_move(42);
        assert!(matches!(
            validate_config(&config),
            Err(Error::Config(ConfigError::UnalignedMoveSize(42)))
        ));
    }

    #[test]
    fn test_move_size_too_small() {
        let config = PlatformConfig::default().bytes_per_move(36);
        assert!(matches!(
            validate_config(&config),
            Err(Error::Config(ConfigError::MoveSizeTooSmall { minimum: 40, .. }))
        ));
    }

    #[test]
    fn test_padded_move_size_accepted() {
        let config = PlatformConfig::with_motor_count(2)
            .unwrap()
            .bytes_per_move(32);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_buffer_too_small() {
        // 10 words per move, 10-word ring only holds 9
        let config = PlatformConfig::default().buffer_depth_words(10);
        assert!(matches!(
            validate_config(&config),
            Err(Error::Config(ConfigError::BufferTooSmall { words: 9, required: 10 }))
        ));
    }

    #[test]
    fn test_bit_shift_range() {
        for shift in [0u8, 31] {
            let config = PlatformConfig::default().bit_shift(shift);
            assert!(matches!(
                validate_config(&config),
                Err(Error::Config(ConfigError::InvalidBitShift(_)))
            ));
        }
    }

    #[test]
    fn test_accumulator_overflow() {
        let config = PlatformConfig::default()
            .bit_shift(30)
            .max_time(u32::MAX);
        assert!(matches!(
            validate_config(&config),
            Err(Error::Config(ConfigError::AccumulatorOverflow { .. }))
        ));
    }

    #[test]
    fn test_duplicate_motor_name() {
        let mut config = PlatformConfig::default();
        config.motors[1] = MotorConfig::new("x");
        assert!(matches!(
            validate_config(&config),
            Err(Error::Config(ConfigError::DuplicateMotorName(_)))
        ));
    }
}
