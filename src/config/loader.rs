//! Platform file loading (std only).
//!
//! A platform file is TOML. Top-level keys size the instruction, the ring and
//! the fixed-point format; each `[[motors]]` table adds one axis in wire
//! order. Omitted keys take their defaults.
//!
//! ```toml
//! bytes_per_move = 32       # header word, 2 × 3 coefficient words, 1 padding word
//! buffer_depth_words = 64
//! bit_shift = 8
//! max_time = 100            # ticks per move
//! tick_hz = 1000000
//!
//! [[motors]]
//! name = "x"
//!
//! [[motors]]
//! name = "y"
//! invert_direction = true
//! ```

use std::fs;
use std::path::Path;

use crate::error::{ConfigError, Error, Result};

use super::PlatformConfig;

/// Read and validate a platform file.
///
/// The buffer handed to [`Controller::new`](crate::Controller::new) must have
/// `buffer_depth_words` words.
///
/// # Errors
///
/// Returns [`ConfigError::IoError`] if the file cannot be read, otherwise as
/// [`parse_config`].
///
/// # Example
///
/// ```rust,no_run
/// use polystep::{load_config, Controller, TransactionalFifo};
///
/// let platform = load_config("platform.toml")?;
/// let core = Controller::new(platform, TransactionalFifo::<64>::new())?;
/// # Ok::<(), polystep::Error>(())
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PlatformConfig> {
    let content = fs::read_to_string(path.as_ref()).map_err(|e| {
        let msg = heapless::String::try_from(e.to_string().as_str()).unwrap_or_default();
        Error::Config(ConfigError::IoError(msg))
    })?;

    parse_config(&content)
}

/// Parse and validate platform TOML held in memory.
///
/// # Errors
///
/// Returns [`ConfigError::ParseError`] for malformed TOML or unknown value
/// types, and any error [`validate_config`](super::validate_config) reports.
pub fn parse_config(content: &str) -> Result<PlatformConfig> {
    let config: PlatformConfig = toml::from_str(content).map_err(|e| {
        let msg = heapless::String::try_from(e.message()).unwrap_or_default();
        Error::Config(ConfigError::ParseError(msg))
    })?;

    super::validation::validate_config(&config)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config, PlatformConfig::default());
    }

    #[test]
    fn test_parse_two_axis_platform() {
        let toml = r#"
bytes_per_move = 32
buffer_depth_words = 64
bit_shift = 16
max_time = 2000

[[motors]]
name = "pan"

[[motors]]
name = "tilt"
invert_direction = true
"#;

        let config = parse_config(toml).unwrap();
        assert_eq!(config.motor_count(), 2);
        assert_eq!(config.words_per_move(), 8);
        assert_eq!(config.bit_shift, 16);
        let (index, tilt) = config.motor("tilt").unwrap();
        assert_eq!(index, 1);
        assert!(tilt.invert_direction);
    }

    #[test]
    fn test_parse_rejects_invalid_layout() {
        let toml = r#"
bytes_per_move = 30

[[motors]]
name = "x"
"#;

        assert!(matches!(
            parse_config(toml),
            Err(Error::Config(ConfigError::UnalignedMoveSize(30)))
        ));
    }

    #[test]
    fn test_parse_error_reported() {
        assert!(matches!(
            parse_config("bytes_per_move = \"many\""),
            Err(Error::Config(ConfigError::ParseError(_)))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            load_config("/nonexistent/polystep.toml"),
            Err(Error::Config(ConfigError::IoError(_)))
        ));
    }
}
