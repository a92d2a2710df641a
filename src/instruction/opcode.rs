//! Link command codes, instruction opcodes and the status word.

/// Width of one link word in bits.
pub const WORD_SIZE: u32 = 32;

/// Width of one link word in bytes.
pub const WORD_BYTES: usize = (WORD_SIZE / 8) as usize;

/// Width of a command code in bits.
pub const COMMAND_SIZE: u32 = 8;

/// Polynomial order evaluated per motor (linear, quadratic, cubic).
pub const DEGREE: usize = 3;

/// Largest motor count the core is built for.
pub const MAX_MOTORS: usize = 8;

/// Largest instruction, in words, the core will buffer.
pub const MAX_WORDS_PER_MOVE: usize = 32;

/// Commands accepted over the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    /// No operation.
    Empty = 0,
    /// Enable instruction execution.
    Start = 1,
    /// Disable instruction execution.
    Stop = 2,
    /// Stage one instruction word.
    Write = 3,
    /// Reply with the status word.
    Status = 4,
}

impl Command {
    /// Decode a raw command code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Command::Empty),
            1 => Some(Command::Start),
            2 => Some(Command::Stop),
            3 => Some(Command::Write),
            4 => Some(Command::Status),
            _ => None,
        }
    }

    /// Raw command code.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// Instruction opcodes carried in byte 0 of an instruction header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Opcode {
    /// Polynomial move for every motor.
    Move = 1,
}

impl Opcode {
    /// Decode a raw opcode byte.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(Opcode::Move),
            _ => None,
        }
    }

    /// Raw opcode byte.
    #[inline]
    pub const fn byte(self) -> u8 {
        self as u8
    }
}

/// Controller status as reported by the `STATUS` command.
///
/// Bit 0 is `FULL`, bit 1 is `DISPATCH_ERROR`; the remaining bits read as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusWord(u32);

impl StatusWord {
    /// Buffer cannot take another full instruction.
    pub const FULL: u32 = 1 << 0;
    /// Sticky dispatch fault.
    pub const DISPATCH_ERROR: u32 = 1 << 1;

    /// Compose a status word from its flags.
    #[inline]
    pub const fn new(full: bool, dispatch_error: bool) -> Self {
        let mut bits = 0;
        if full {
            bits |= Self::FULL;
        }
        if dispatch_error {
            bits |= Self::DISPATCH_ERROR;
        }
        Self(bits)
    }

    /// Interpret a word received from the link. Reserved bits are dropped.
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & (Self::FULL | Self::DISPATCH_ERROR))
    }

    /// Raw word.
    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// `FULL` flag.
    #[inline]
    pub const fn is_full(self) -> bool {
        self.0 & Self::FULL != 0
    }

    /// `DISPATCH_ERROR` flag.
    #[inline]
    pub const fn dispatch_error(self) -> bool {
        self.0 & Self::DISPATCH_ERROR != 0
    }

    /// Copy of this word with `FULL` cleared.
    #[inline]
    pub const fn without_full(self) -> Self {
        Self(self.0 & !Self::FULL)
    }
}

impl From<StatusWord> for u32 {
    fn from(status: StatusWord) -> Self {
        status.0
    }
}
