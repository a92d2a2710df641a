//! Instruction module for polystep.
//!
//! Link command codes, the status word, the fixed-width instruction layout and
//! a host-side builder for `MOVE` instructions.

mod builder;
mod encoding;
mod opcode;

pub use builder::{validate_move, Kinematics, MoveBuilder};
pub use encoding::{Header, Instruction, InstructionBytes, InstructionWords};
pub use opcode::{
    Command, Opcode, StatusWord, COMMAND_SIZE, DEGREE, MAX_MOTORS, MAX_WORDS_PER_MOVE, WORD_BYTES,
    WORD_SIZE,
};
