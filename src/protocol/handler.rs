//! Command protocol handler.
//!
//! Sole writer of the instruction buffer. Words of an instruction are staged
//! one transaction at a time and published with a single write commit once
//! `bytes_per_move` bytes have arrived.

use crate::buffer::TransactionalBuffer;
use crate::instruction::{Command, StatusWord, WORD_BYTES};

use super::link::LinkInput;

/// Handler state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HandlerState {
    /// Power-on; clears execute and moves to `WaitCommand`.
    #[default]
    Reset,
    /// Waiting for a command pulse.
    WaitCommand,
    /// A write was accepted; waiting for its data word.
    WaitWord,
    /// The word has been staged; commit if the instruction is complete.
    Write,
}

/// Status word for a buffer with `free_words` free and the given fault flag.
///
/// `FULL` is set when less than one whole instruction fits.
#[inline]
pub fn status_word(free_words: usize, bytes_per_move: usize, dispatch_error: bool) -> StatusWord {
    StatusWord::new(free_words * WORD_BYTES < bytes_per_move, dispatch_error)
}

/// Word-oriented command/response state machine.
#[derive(Debug, Clone)]
pub struct ProtocolHandler {
    state: HandlerState,
    execute: bool,
    word_to_send: u32,
    bytes_received: usize,
    bytes_per_move: usize,
    refused: u32,
}

impl ProtocolHandler {
    /// Create a handler for instructions of `bytes_per_move` bytes.
    pub fn new(bytes_per_move: usize) -> Self {
        Self {
            state: HandlerState::Reset,
            execute: false,
            word_to_send: 0,
            bytes_received: 0,
            bytes_per_move,
            refused: 0,
        }
    }

    /// Advance one tick.
    ///
    /// `dispatch_error` is the dispatcher's fault flag as registered on the
    /// previous tick. The buffer is the write side only.
    pub fn tick<B: TransactionalBuffer>(
        &mut self,
        input: &LinkInput,
        buffer: &mut B,
        dispatch_error: bool,
    ) {
        let status = status_word(buffer.free_space(), self.bytes_per_move, dispatch_error);

        match self.state {
            HandlerState::Reset => {
                self.execute = false;
                self.state = HandlerState::WaitCommand;
            }
            HandlerState::WaitCommand => {
                if input.command_ready {
                    self.command(input.command, status);
                }
            }
            HandlerState::WaitWord => {
                if input.word_complete {
                    if buffer.write(input.word_received).is_ok() {
                        self.bytes_received += WORD_BYTES;
                    } else {
                        // never commit a short instruction
                        buffer.write_rollback();
                        self.bytes_received = 0;
                        error!("protocol: buffer overflow, word {=u32:#x} dropped", input.word_received);
                    }
                    self.state = HandlerState::Write;
                }
            }
            HandlerState::Write => {
                if self.bytes_received >= self.bytes_per_move {
                    self.bytes_received = 0;
                    buffer.write_commit();
                    trace!("protocol: instruction committed");
                }
                self.state = HandlerState::WaitCommand;
            }
        }
    }

    fn command(&mut self, code: u8, status: StatusWord) {
        match Command::from_code(code) {
            Some(Command::Empty) => {}
            Some(Command::Start) => self.execute = true,
            Some(Command::Stop) => self.execute = false,
            Some(Command::Write) => {
                // An instruction already in progress is always completed.
                if !status.is_full() || self.bytes_received != 0 {
                    self.word_to_send = status.without_full().bits();
                    self.state = HandlerState::WaitWord;
                } else {
                    self.word_to_send = status.bits();
                    self.refused = self.refused.wrapping_add(1);
                    debug!("protocol: write refused, buffer full");
                }
            }
            Some(Command::Status) => self.word_to_send = status.bits(),
            None => warn!("protocol: unknown command {=u8}", code),
        }
    }

    /// Return to power-on state.
    ///
    /// Words staged for a partial instruction are the buffer's to discard.
    pub fn reset(&mut self) {
        self.state = HandlerState::Reset;
        self.execute = false;
        self.word_to_send = 0;
        self.bytes_received = 0;
        self.refused = 0;
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> HandlerState {
        self.state
    }

    /// Execution enable flag.
    #[inline]
    pub fn execute(&self) -> bool {
        self.execute
    }

    /// Reply word for the current transaction.
    #[inline]
    pub fn word_to_send(&self) -> u32 {
        self.word_to_send
    }

    /// Bytes of the instruction currently being received.
    #[inline]
    pub fn bytes_received(&self) -> usize {
        self.bytes_received
    }

    /// Writes refused because the buffer was full.
    #[inline]
    pub fn refused_writes(&self) -> u32 {
        self.refused
    }

    /// Instruction size in bytes.
    #[inline]
    pub fn bytes_per_move(&self) -> usize {
        self.bytes_per_move
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::TransactionalFifo;

    const MOVE_BYTES: usize = 8;

    fn ready() -> (ProtocolHandler, TransactionalFifo<8>) {
        let mut handler = ProtocolHandler::new(MOVE_BYTES);
        let mut fifo = TransactionalFifo::new();
        handler.tick(&LinkInput::IDLE, &mut fifo, false);
        assert_eq!(handler.state(), HandlerState::WaitCommand);
        (handler, fifo)
    }

    fn write_word(handler: &mut ProtocolHandler, fifo: &mut TransactionalFifo<8>, word: u32) {
        handler.tick(&LinkInput::command(Command::Write), fifo, false);
        handler.tick(&LinkInput::IDLE, fifo, false);
        handler.tick(&LinkInput::word(word), fifo, false);
        handler.tick(&LinkInput::IDLE, fifo, false);
        assert_eq!(handler.state(), HandlerState::WaitCommand);
    }

    #[test]
    fn test_start_stop_idempotent() {
        let (mut handler, mut fifo) = ready();
        for _ in 0..3 {
            handler.tick(&LinkInput::command(Command::Start), &mut fifo, false);
            assert!(handler.execute());
        }
        for _ in 0..3 {
            handler.tick(&LinkInput::command(Command::Stop), &mut fifo, false);
            assert!(!handler.execute());
        }
    }

    #[test]
    fn test_commit_on_complete_instruction() {
        let (mut handler, mut fifo) = ready();
        write_word(&mut handler, &mut fifo, 0x0101);
        assert_eq!(handler.bytes_received(), 4);
        assert!(fifo.is_empty());

        write_word(&mut handler, &mut fifo, 42);
        assert_eq!(handler.bytes_received(), 0);
        assert!(!fifo.is_empty());
        assert_eq!(fifo.read(), Some(0x0101));
        assert_eq!(fifo.read(), Some(42));
    }

    #[test]
    fn test_status_reports_full_and_error() {
        let (mut handler, mut fifo) = ready();
        handler.tick(&LinkInput::command(Command::Status), &mut fifo, true);
        assert_eq!(handler.word_to_send(), StatusWord::DISPATCH_ERROR);

        // 7 usable words: three instructions of two words leave one free
        for w in 0..6 {
            write_word(&mut handler, &mut fifo, w);
        }
        handler.tick(&LinkInput::command(Command::Status), &mut fifo, false);
        assert_eq!(handler.word_to_send(), StatusWord::FULL);
    }

    #[test]
    fn test_write_refused_when_full() {
        let (mut handler, mut fifo) = ready();
        for w in 0..6 {
            write_word(&mut handler, &mut fifo, w);
        }
        handler.tick(&LinkInput::command(Command::Write), &mut fifo, false);
        assert_eq!(handler.state(), HandlerState::WaitCommand);
        assert_eq!(handler.word_to_send(), StatusWord::FULL);
        assert_eq!(handler.refused_writes(), 1);

        // the data word of a refused write is ignored
        handler.tick(&LinkInput::word(99), &mut fifo, false);
        assert_eq!(fifo.free_space(), 1);
    }

    #[test]
    fn test_partial_instruction_completes_past_threshold() {
        let mut handler = ProtocolHandler::new(12);
        let mut fifo = TransactionalFifo::<8>::new();
        handler.tick(&LinkInput::IDLE, &mut fifo, false);

        // first instruction fills 3 of 7 words, the second is two words in
        for w in 0..5 {
            handler.tick(&LinkInput::command(Command::Write), &mut fifo, false);
            handler.tick(&LinkInput::word(w), &mut fifo, false);
            handler.tick(&LinkInput::IDLE, &mut fifo, false);
        }
        // 2 words free: FULL, but the instruction is mid-way
        assert_eq!(handler.bytes_received(), 8);
        assert!(status_word(fifo.free_space(), 12, false).is_full());
        handler.tick(&LinkInput::command(Command::Write), &mut fifo, false);
        assert_eq!(handler.state(), HandlerState::WaitWord);
        handler.tick(&LinkInput::word(5), &mut fifo, false);
        handler.tick(&LinkInput::IDLE, &mut fifo, false);
        assert_eq!(handler.bytes_received(), 0);
        assert_eq!(fifo.free_space(), 1);
        assert_eq!(handler.refused_writes(), 0);
    }

    #[test]
    fn test_unknown_command_ignored() {
        let (mut handler, mut fifo) = ready();
        handler.tick(&LinkInput::command_code(0x7f), &mut fifo, false);
        assert_eq!(handler.state(), HandlerState::WaitCommand);
        assert!(!handler.execute());
        assert_eq!(handler.word_to_send(), 0);
    }

    #[test]
    fn test_reset_clears_execute() {
        let (mut handler, mut fifo) = ready();
        handler.tick(&LinkInput::command(Command::Start), &mut fifo, false);
        handler.reset();
        assert_eq!(handler.state(), HandlerState::Reset);
        assert!(!handler.execute());
    }

    /// Reports more room than its ring really has.
    struct Overcommitted(TransactionalFifo<4>);

    impl TransactionalBuffer for Overcommitted {
        fn write(&mut self, word: u32) -> Result<(), crate::error::BufferError> {
            self.0.write(word)
        }
        fn write_commit(&mut self) {
            self.0.write_commit()
        }
        fn write_rollback(&mut self) {
            self.0.write_rollback()
        }
        fn read(&mut self) -> Option<u32> {
            self.0.read()
        }
        fn read_commit(&mut self) {
            self.0.read_commit()
        }
        fn read_rollback(&mut self) {
            self.0.read_rollback()
        }
        fn free_space(&self) -> usize {
            64
        }
        fn is_empty(&self) -> bool {
            self.0.is_empty()
        }
        fn depth(&self) -> usize {
            self.0.depth()
        }
        fn clear(&mut self) {
            self.0.clear()
        }
    }

    #[test]
    fn test_overflow_drops_partial_instruction() {
        let mut handler = ProtocolHandler::new(16);
        let mut buffer = Overcommitted(TransactionalFifo::new());
        handler.tick(&LinkInput::IDLE, &mut buffer, false);

        // the ring holds 3 words, the instruction needs 4
        for w in 0..4 {
            handler.tick(&LinkInput::command(Command::Write), &mut buffer, false);
            handler.tick(&LinkInput::word(w), &mut buffer, false);
            handler.tick(&LinkInput::IDLE, &mut buffer, false);
        }
        assert_eq!(handler.bytes_received(), 0);
        assert!(buffer.is_empty());
        assert_eq!(buffer.0.free_space(), 3);

        // the next instruction starts clean
        for w in 0..3 {
            handler.tick(&LinkInput::command(Command::Write), &mut buffer, false);
            handler.tick(&LinkInput::word(w), &mut buffer, false);
            handler.tick(&LinkInput::IDLE, &mut buffer, false);
        }
        assert_eq!(handler.bytes_received(), 12);
        assert!(buffer.is_empty());
    }
}
