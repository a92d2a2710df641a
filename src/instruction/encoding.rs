//! Instruction wire format.
//!
//! ```text
//! word 0          : byte 0 opcode | byte 1 aux | bytes 2..4 zero
//! words 1..=3m    : motor 0 (linear, quadratic, cubic), motor 1, ...
//! remaining words : zero padding up to bytes_per_move
//! ```
//!
//! Words travel little-endian on a byte-oriented link, so byte 0 of the
//! instruction is the opcode.

use heapless::Vec;

use crate::config::{validate_move_size, PlatformConfig};
use crate::error::{EncodingError, Error, Result};
use crate::motion::{CoefficientVector, Coefficients};

use super::opcode::{Opcode, DEGREE, MAX_MOTORS, MAX_WORDS_PER_MOVE, WORD_BYTES};

/// Encoded instruction words, padding included.
pub type InstructionWords = Vec<u32, MAX_WORDS_PER_MOVE>;

/// Encoded instruction bytes, padding included.
pub type InstructionBytes = Vec<u8, { MAX_WORDS_PER_MOVE * WORD_BYTES }>;

/// Decoded instruction header word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Header {
    /// Raw opcode byte (may be unrecognized).
    pub opcode: u8,
    /// Auxiliary output byte.
    pub aux: u8,
}

impl Header {
    /// Split a header word into opcode and aux bytes.
    #[inline]
    pub const fn from_word(word: u32) -> Self {
        Self {
            opcode: (word & 0xff) as u8,
            aux: ((word >> 8) & 0xff) as u8,
        }
    }

    /// Pack opcode and aux into a header word.
    #[inline]
    pub const fn to_word(self) -> u32 {
        self.opcode as u32 | (self.aux as u32) << 8
    }

    /// Recognized opcode, if any.
    #[inline]
    pub fn instruction(self) -> Option<Opcode> {
        Opcode::from_byte(self.opcode)
    }
}

/// One motion instruction as the host builds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    opcode: u8,
    aux: u8,
    coefficients: Vec<Coefficients, MAX_MOTORS>,
}

impl Instruction {
    /// A `MOVE` instruction.
    pub fn new_move(aux: u8, coefficients: &[Coefficients]) -> Self {
        Self::raw(Opcode::Move.byte(), aux, coefficients)
    }

    /// An instruction with an arbitrary opcode byte.
    ///
    /// The core faults on anything but `MOVE`; this exists to exercise that path.
    pub fn raw(opcode: u8, aux: u8, coefficients: &[Coefficients]) -> Self {
        let mut v = Vec::new();
        for c in coefficients.iter().take(MAX_MOTORS) {
            let _ = v.push(*c);
        }
        Self {
            opcode,
            aux,
            coefficients: v,
        }
    }

    /// Raw opcode byte.
    #[inline]
    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    /// Auxiliary output byte.
    #[inline]
    pub fn aux(&self) -> u8 {
        self.aux
    }

    /// Per-motor coefficients.
    #[inline]
    pub fn coefficients(&self) -> &[Coefficients] {
        &self.coefficients
    }

    /// Coefficients as the vector the dispatcher produces.
    pub fn coefficient_vector(&self) -> CoefficientVector {
        CoefficientVector::from_slice(&self.coefficients)
    }

    /// Header word.
    #[inline]
    pub fn header(&self) -> Header {
        Header {
            opcode: self.opcode,
            aux: self.aux,
        }
    }

    /// Encode into exactly `config.words_per_move()` words.
    ///
    /// # Errors
    ///
    /// Returns an error if the motor count differs from the platform's, or if
    /// `bytes_per_move` cannot hold the header and every coefficient.
    pub fn encode(&self, config: &PlatformConfig) -> Result<InstructionWords> {
        validate_move_size(config)?;
        if self.coefficients.len() != config.motor_count() {
            return Err(Error::Encoding(EncodingError::MotorCountMismatch {
                found: self.coefficients.len(),
                expected: config.motor_count(),
            }));
        }

        let mut words = InstructionWords::new();
        let _ = words.push(self.header().to_word());
        for c in &self.coefficients {
            for w in c.to_words() {
                let _ = words.push(w);
            }
        }
        while words.len() < config.words_per_move() {
            let _ = words.push(0);
        }
        Ok(words)
    }

    /// Encode into the little-endian byte stream of `bytes_per_move` bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the motor count differs from the platform's, or if
    /// `bytes_per_move` cannot hold the header and every coefficient.
    pub fn to_le_bytes(&self, config: &PlatformConfig) -> Result<InstructionBytes> {
        let mut bytes = InstructionBytes::new();
        for w in self.encode(config)? {
            let _ = bytes.extend_from_slice(&w.to_le_bytes());
        }
        Ok(bytes)
    }

    /// Decode an instruction from its word stream.
    ///
    /// Padding words are ignored. Unrecognized opcodes decode fine; whether they
    /// execute is the dispatcher's concern.
    ///
    /// # Errors
    ///
    /// Returns an error if `words` is not exactly one instruction long, or if
    /// `bytes_per_move` cannot hold the header and every coefficient.
    pub fn decode(words: &[u32], config: &PlatformConfig) -> Result<Self> {
        validate_move_size(config)?;
        if words.len() != config.words_per_move() {
            return Err(Error::Encoding(EncodingError::WrongLength {
                found: words.len(),
                expected: config.words_per_move(),
            }));
        }

        let header = Header::from_word(words[0]);
        let mut coefficients = Vec::new();
        for chunk in words[1..1 + config.coefficient_words()].chunks_exact(DEGREE) {
            let _ = coefficients.push(Coefficients::from_words([chunk[0], chunk[1], chunk[2]]));
        }

        Ok(Self {
            opcode: header.opcode,
            aux: header.aux,
            coefficients,
        })
    }

    /// Decode from the little-endian byte stream.
    ///
    /// # Errors
    ///
    /// Returns an error if `bytes` is not exactly one instruction long.
    pub fn decode_le_bytes(bytes: &[u8], config: &PlatformConfig) -> Result<Self> {
        if bytes.len() != config.bytes_per_move {
            return Err(Error::Encoding(EncodingError::WrongLength {
                found: bytes.len() / WORD_BYTES,
                expected: config.words_per_move(),
            }));
        }
        let mut words = InstructionWords::new();
        for chunk in bytes.chunks_exact(WORD_BYTES) {
            let _ = words.push(u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
        }
        Self::decode(&words, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;

    fn two_axis() -> PlatformConfig {
        PlatformConfig::with_motor_count(2).unwrap().bytes_per_move(32)
    }

    #[test]
    fn test_header_layout() {
        let header = Header { opcode: 1, aux: 0xa5 };
        assert_eq!(header.to_word(), 0x0000_a501);
        assert_eq!(Header::from_word(0xffff_a501), header);
        assert_eq!(header.instruction(), Some(Opcode::Move));
    }

    #[test]
    fn test_encode_pads_to_move_size() {
        let config = two_axis();
        let instr = Instruction::new_move(
            7,
            &[Coefficients::new(1, 2, 3), Coefficients::new(-1, -2, -3)],
        );
        let words = instr.encode(&config).unwrap();
        assert_eq!(words.len(), 8);
        assert_eq!(words[0], 0x0701);
        assert_eq!(&words[1..4], &[1, 2, 3]);
        assert_eq!(words[4], (-1i32) as u32);
        assert_eq!(words[7], 0);
    }

    #[test]
    fn test_byte_zero_is_opcode() {
        let config = two_axis();
        let instr = Instruction::new_move(0x42, &[Coefficients::ZERO; 2]);
        let bytes = instr.to_le_bytes(&config).unwrap();
        assert_eq!(bytes.len(), 32);
        assert_eq!(bytes[0], Opcode::Move.byte());
        assert_eq!(bytes[1], 0x42);
        assert_eq!(Instruction::decode_le_bytes(&bytes, &config).unwrap(), instr);
    }

    #[test]
    fn test_motor_count_mismatch() {
        let config = two_axis();
        let instr = Instruction::new_move(0, &[Coefficients::ZERO]);
        assert!(matches!(
            instr.encode(&config),
            Err(Error::Encoding(EncodingError::MotorCountMismatch { found: 1, expected: 2 }))
        ));
    }

    #[test]
    fn test_decode_wrong_length() {
        let config = two_axis();
        assert!(matches!(
            Instruction::decode(&[0; 7], &config),
            Err(Error::Encoding(EncodingError::WrongLength { found: 7, expected: 8 }))
        ));
    }

    #[test]
    fn test_move_size_too_small_for_coefficients() {
        // builder methods do not validate
        let config = PlatformConfig::with_motor_count(2).unwrap().bytes_per_move(8);
        let too_small = |r: Result<_>| {
            matches!(
                r,
                Err(Error::Config(ConfigError::MoveSizeTooSmall { bytes: 8, minimum: 28 }))
            )
        };

        assert!(too_small(Instruction::decode(&[0x0001, 0], &config).map(|_| ())));
        assert!(too_small(Instruction::decode_le_bytes(&[1, 0, 0, 0, 0, 0, 0, 0], &config).map(|_| ())));
        let instr = Instruction::new_move(0, &[Coefficients::ZERO; 2]);
        assert!(too_small(instr.encode(&config).map(|_| ())));
        assert!(too_small(instr.to_le_bytes(&config).map(|_| ())));
    }
}
