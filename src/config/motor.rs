//! Per-motor configuration from TOML.

use heapless::String;
use serde::Deserialize;

/// Configuration of one motor channel.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MotorConfig {
    /// Human-readable name (max 32 chars).
    pub name: String<32>,

    /// Invert direction pin logic.
    #[serde(default)]
    pub invert_direction: bool,
}

impl MotorConfig {
    /// Create a motor channel with the given name.
    ///
    /// Names longer than 32 characters are truncated.
    pub fn new(name: &str) -> Self {
        let mut s = String::new();
        for ch in name.chars() {
            if s.push(ch).is_err() {
                break;
            }
        }
        Self {
            name: s,
            invert_direction: false,
        }
    }

    /// Set direction inversion.
    pub fn inverted(mut self, invert: bool) -> Self {
        self.invert_direction = invert;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_name_truncated() {
        let long = "a-very-long-motor-name-that-keeps-going";
        let motor = MotorConfig::new(long);
        assert_eq!(motor.name.len(), 32);
        assert!(long.starts_with(motor.name.as_str()));
    }
}
