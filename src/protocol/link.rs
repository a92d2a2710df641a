//! Per-tick view of the word-oriented link.

use crate::instruction::Command;

/// Link signals sampled on one tick.
///
/// `command_ready` and `word_complete` are single-tick pulses; `command` and
/// `word_received` are only meaningful while their pulse is high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkInput {
    /// A command code has been received.
    pub command_ready: bool,
    /// Received command code.
    pub command: u8,
    /// A data word has been received.
    pub word_complete: bool,
    /// Received data word.
    pub word_received: u32,
}

impl LinkInput {
    /// Nothing happening on the link.
    pub const IDLE: Self = Self {
        command_ready: false,
        command: 0,
        word_complete: false,
        word_received: 0,
    };

    /// A command pulse.
    #[inline]
    pub const fn command(command: Command) -> Self {
        Self::command_code(command.code())
    }

    /// A command pulse carrying a raw code, which need not be a known command.
    #[inline]
    pub const fn command_code(code: u8) -> Self {
        Self {
            command_ready: true,
            command: code,
            ..Self::IDLE
        }
    }

    /// A word pulse.
    #[inline]
    pub const fn word(word: u32) -> Self {
        Self {
            word_complete: true,
            word_received: word,
            ..Self::IDLE
        }
    }

    /// No pulse is high.
    #[inline]
    pub fn is_idle(&self) -> bool {
        !self.command_ready && !self.word_complete
    }
}
