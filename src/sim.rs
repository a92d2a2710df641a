//! Host-side simulation driver.
//!
//! [`Simulator`] plays the link master against a [`Controller`], one tick at
//! a time. A transaction takes five ticks:
//!
//! ```text
//! tick 0: command pulse
//! tick 1: idle
//! tick 2: word pulse      (reply sampled here)
//! tick 3: idle
//! tick 4: idle
//! ```

use crate::buffer::TransactionalBuffer;
use crate::config::PlatformConfig;
use crate::controller::Controller;
use crate::error::Result;
use crate::instruction::{Command, Instruction, StatusWord};
use crate::protocol::LinkInput;

/// Result of writing one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteOutcome {
    /// Every word was staged and the instruction committed.
    Accepted,
    /// The buffer was full; nothing was staged.
    Refused,
}

/// Tick-accurate link master for a [`Controller`].
pub struct Simulator<B: TransactionalBuffer> {
    controller: Controller<B>,
    finished_pulses: u32,
}

impl<B: TransactionalBuffer> Simulator<B> {
    /// Build a controller and bring it out of reset.
    ///
    /// # Errors
    ///
    /// Returns a configuration error from [`Controller::new`].
    pub fn new(config: PlatformConfig, buffer: B) -> Result<Self> {
        let mut sim = Self::from_controller(Controller::new(config, buffer)?);
        sim.tick(&LinkInput::IDLE);
        Ok(sim)
    }

    /// Drive an existing controller.
    pub fn from_controller(controller: Controller<B>) -> Self {
        Self {
            controller,
            finished_pulses: 0,
        }
    }

    /// Advance one tick.
    pub fn tick(&mut self, input: &LinkInput) {
        self.controller.tick(input);
        if self.controller.finished() {
            self.finished_pulses += 1;
        }
    }

    /// Advance `ticks` idle ticks.
    pub fn run(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.tick(&LinkInput::IDLE);
        }
    }

    /// Run idle ticks until nothing is queued or moving.
    ///
    /// Returns the ticks taken, or `None` if `limit` ran out first.
    pub fn run_until_idle(&mut self, limit: u64) -> Option<u64> {
        for ticks in 0..limit {
            if self.controller.is_idle() {
                return Some(ticks);
            }
            self.tick(&LinkInput::IDLE);
        }
        self.controller.is_idle().then_some(limit)
    }

    /// One full transaction with a raw command code.
    ///
    /// Returns the reply word.
    pub fn transact_code(&mut self, code: u8, word: u32) -> u32 {
        self.tick(&LinkInput::command_code(code));
        self.tick(&LinkInput::IDLE);
        self.tick(&LinkInput::word(word));
        let reply = self.controller.word_to_send();
        self.tick(&LinkInput::IDLE);
        self.tick(&LinkInput::IDLE);
        reply
    }

    /// One full transaction.
    pub fn transact(&mut self, command: Command, word: u32) -> u32 {
        self.transact_code(command.code(), word)
    }

    /// Enable execution.
    pub fn start(&mut self) {
        self.transact(Command::Start, 0);
    }

    /// Disable execution.
    pub fn stop(&mut self) {
        self.transact(Command::Stop, 0);
    }

    /// Query the status word.
    pub fn status(&mut self) -> StatusWord {
        StatusWord::from_bits(self.transact(Command::Status, 0))
    }

    /// Write one word.
    ///
    /// A refused write replies with `FULL` set; an accepted one never does.
    pub fn write_word(&mut self, word: u32) -> WriteOutcome {
        let reply = StatusWord::from_bits(self.transact(Command::Write, word));
        if reply.is_full() {
            WriteOutcome::Refused
        } else {
            WriteOutcome::Accepted
        }
    }

    /// Write every word of an instruction.
    ///
    /// # Errors
    ///
    /// Returns an encoding error if the instruction does not match the
    /// platform's motor count.
    pub fn write_instruction(&mut self, instruction: &Instruction) -> Result<WriteOutcome> {
        let words = instruction.encode(self.controller.config())?;
        for word in words {
            if self.write_word(word) == WriteOutcome::Refused {
                return Ok(WriteOutcome::Refused);
            }
        }
        Ok(WriteOutcome::Accepted)
    }

    /// Out-of-band reset, then bring the core out of reset.
    pub fn reset(&mut self) {
        self.controller.reset();
        self.finished_pulses = 0;
        self.tick(&LinkInput::IDLE);
    }

    /// `finished` pulses seen since creation or reset.
    #[inline]
    pub fn finished_pulses(&self) -> u32 {
        self.finished_pulses
    }

    /// The controller.
    #[inline]
    pub fn controller(&self) -> &Controller<B> {
        &self.controller
    }

    /// The controller, mutably.
    #[inline]
    pub fn controller_mut(&mut self) -> &mut Controller<B> {
        &mut self.controller
    }
}
